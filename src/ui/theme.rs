// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Colors and glyphs for the terminal views.
//!
//! Color usage conventions:
//! - accent = titles, the active remote and path
//! - cursor = the highlighted row
//! - directory = directory entries
//! - success = completed transfers, selection marks
//! - warning = running transfers, the filter prompt
//! - error = failures and error boxes
//! - dim = help lines and secondary text

use crossterm::style::Color;

/// Dot spinner shown while a listing is outstanding.
pub const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub accent: Color,
    pub cursor: Color,
    pub directory: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub dim: Color,
    pub selected_mark: &'static str,
    pub unselected_mark: &'static str,
    pub progress_full: char,
    pub progress_empty: char,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Magenta,
            cursor: Color::Cyan,
            directory: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            dim: Color::DarkGrey,
            selected_mark: "[x]",
            unselected_mark: "[ ]",
            progress_full: '█',
            progress_empty: '░',
        }
    }
}

impl Theme {
    pub fn spinner_frame(&self, tick: usize) -> &'static str {
        SPINNER_FRAMES[tick % SPINNER_FRAMES.len()]
    }

    /// A `width`-cell progress bar for a percentage in 0..=100.
    pub fn progress_bar(&self, percent: f64, width: usize) -> String {
        let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
        let mut bar = String::with_capacity(width * 3);
        bar.extend(std::iter::repeat(self.progress_full).take(filled));
        bar.extend(std::iter::repeat(self.progress_empty).take(width - filled));
        bar
    }
}
