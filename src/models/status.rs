// src/models/status.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Triage bucket a listing sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    ToReview,
    ToView,
    ViewedYes,
    ViewedNo,
}

impl Status {
    /// All buckets in display order.
    pub const ALL: [Status; 4] = [
        Status::ToReview,
        Status::ToView,
        Status::ViewedYes,
        Status::ViewedNo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::ToReview => "to-review",
            Status::ToView => "to-view",
            Status::ViewedYes => "viewed-yes",
            Status::ViewedNo => "viewed-no",
        }
    }

    /// Human-readable label, e.g. "To Review".
    pub fn title(&self) -> String {
        self.as_str()
            .split('-')
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| AppError::validation(format!("Unknown status: {s}")))
    }
}
