// src/utils/scan.rs

//! Brace-balanced extraction of `window.<NAME> = { ... }` blocks.
//!
//! Regular expressions cannot match arbitrarily nested braces, so the regex
//! only locates the assignment; the object literal itself is delimited by a
//! depth-counting scan that skips braces inside string literals.

use std::sync::OnceLock;

use regex::Regex;

fn assignment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"window\.([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*\{").expect("static regex is valid")
    })
}

/// A located `window.<NAME> = {...}` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelBlock<'a> {
    pub name: &'a str,
    pub body: &'a str,
}

/// Return the text from `text[start]` (which must be `{`) to its matching `}`.
///
/// Returns `None` when `start` is not an opening brace or the braces never
/// balance.
pub fn balanced_object(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == q {
                quote = None;
            }
            continue;
        }

        match byte {
            b'"' | b'\'' => quote = Some(byte),
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Find every balanced `window.<NAME> = {...}` block in `text`, in order.
pub fn find_blocks(text: &str) -> Vec<ModelBlock<'_>> {
    let mut blocks = Vec::new();
    let mut from = 0;

    while let Some(caps) = assignment_pattern().captures_at(text, from) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let brace = whole.end() - 1;
        match balanced_object(text, brace) {
            Some(body) => {
                blocks.push(ModelBlock {
                    name: name.as_str(),
                    body,
                });
                from = brace + body.len();
            }
            None => from = whole.end(),
        }
    }
    blocks
}

/// Find the block assigned to `window.<marker>`.
pub fn find_block<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    find_blocks(text)
        .into_iter()
        .find(|block| block.name == marker)
        .map(|block| block.body)
}
