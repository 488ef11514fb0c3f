// src/utils/url.rs

//! URL host utilities backing the capability predicates.

use crate::error::{AppError, Result};

/// Extract the lowercased host from a URL.
///
/// A URL without a detectable host is an error rather than "unsupported".
///
/// # Examples
/// ```
/// use houses::utils::url::host_of;
///
/// assert_eq!(
///     host_of("https://WWW.Rightmove.co.uk/properties/1").unwrap(),
///     "www.rightmove.co.uk"
/// );
/// ```
pub fn host_of(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url.trim()).map_err(|_| AppError::InvalidUrl(url.to_string()))?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(host.to_lowercase()),
        _ => Err(AppError::InvalidUrl(url.to_string())),
    }
}

/// Check whether the URL's host is one of `hosts` (case-insensitive).
pub fn check_host_in<S: AsRef<str>>(url: &str, hosts: &[S]) -> Result<bool> {
    let host = host_of(url)?;
    Ok(hosts
        .iter()
        .any(|valid| valid.as_ref().eq_ignore_ascii_case(&host)))
}
