// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! User-facing error messages.
//!
//! Session-level failures (remote enumeration, directory listing) are shown to
//! the user as a short block with the failure, likely causes and things to
//! try. Per-transfer failures are not formatted here; they live on the
//! transfer record.

use std::fmt;

/// Where to look for details after an error.
pub const LOG_HINT: &str = "Details are in ~/.rfetch/rfetch.log (run with -v for more)";

/// Format an error with a title, possible causes and suggested fixes.
///
/// # Example
///
/// ```
/// use rfetch::error::format_error;
///
/// let error = format_error(
///     "Failed to list remotes",
///     &["rclone is not installed or not on PATH"],
///     &["Install rclone: https://rclone.org/install/"],
/// );
/// assert!(error.starts_with("[✗] Failed to list remotes"));
/// ```
pub fn format_error(title: &str, causes: &[&str], fixes: &[&str]) -> String {
    let mut output = format!("[✗] {}\n\n", title);

    if !causes.is_empty() {
        output.push_str("Possible causes:\n");
        for cause in causes {
            output.push_str(&format!("  - {}\n", cause));
        }
        output.push('\n');
    }

    if !fixes.is_empty() {
        output.push_str("Try these fixes:\n");
        for (i, fix) in fixes.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, fix));
        }
        output.push('\n');
    }

    output.push_str(LOG_HINT);
    output
}

/// Title-only variant of [`format_error`].
pub fn format_simple_error(title: &str) -> String {
    format!("[✗] {}\n\n{}", title, LOG_HINT)
}

/// Builder for [`format_error`] messages.
#[derive(Debug, Clone)]
pub struct ErrorBuilder {
    title: String,
    causes: Vec<String>,
    fixes: Vec<String>,
}

impl ErrorBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            causes: Vec::new(),
            fixes: Vec::new(),
        }
    }

    pub fn cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    pub fn fix(mut self, fix: impl Into<String>) -> Self {
        self.fixes.push(fix.into());
        self
    }

    pub fn build(&self) -> String {
        let causes: Vec<&str> = self.causes.iter().map(String::as_str).collect();
        let fixes: Vec<&str> = self.fixes.iter().map(String::as_str).collect();
        format_error(&self.title, &causes, &fixes)
    }
}

impl fmt::Display for ErrorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

/// Message shown when the remote list could not be loaded.
pub fn remotes_error(detail: &str) -> String {
    ErrorBuilder::new("Failed to list remotes")
        .cause(detail)
        .cause("rclone is not installed or not on PATH")
        .cause("No remotes are configured")
        .fix("Install rclone: https://rclone.org/install/")
        .fix("Configure a remote: rclone config")
        .fix("Point rfetch at the binary: rfetch --rclone /path/to/rclone")
        .build()
}

/// Message shown when a directory listing failed.
pub fn listing_error(location: &str, detail: &str) -> String {
    ErrorBuilder::new(format!("Failed to list files at {}", location))
        .cause(detail)
        .cause("The remote is misconfigured or its credentials expired")
        .cause("The path no longer exists")
        .fix("Check the remote: rclone config show")
        .fix("Press r to retry")
        .build()
}
