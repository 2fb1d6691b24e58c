// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message body cleanup.

use flatmate_core::FlatmateError;

/// Remove angle brackets so bodies can never carry markup.
pub fn strip_markup(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '<' | '>')).collect()
}

/// Clean a single-send body: strip markup, then require 1..=`max_chars` characters.
pub fn validate_body(text: &str, max_chars: usize) -> Result<String, FlatmateError> {
    let body = strip_markup(text);
    if body.trim().is_empty() {
        return Err(FlatmateError::Validation(
            "message must not be empty".to_string(),
        ));
    }
    let len = body.chars().count();
    if len > max_chars {
        return Err(FlatmateError::Validation(format!(
            "message is too long ({len} characters, max {max_chars})"
        )));
    }
    Ok(body)
}

/// Clean a batched body: strip markup and cut to `max_chars`.
///
/// Returns `None` when nothing but whitespace is left.
pub fn clean_batched(text: &str, max_chars: usize) -> Option<String> {
    let body: String = strip_markup(text).chars().take(max_chars).collect();
    (!body.trim().is_empty()).then_some(body)
}
