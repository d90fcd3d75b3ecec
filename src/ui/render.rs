// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Text rendering of the application state.
//!
//! [`render`] turns an [`App`] into styled lines without touching the
//! terminal; [`draw`] writes them out. Keeping the two apart lets the views
//! be tested as plain text.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, Screen};
use crate::queue::ItemStatus;
use crate::transfer::{Transfer, TransferStatus};
use crate::utils::format_size;

use super::theme::Theme;

/// Lines reserved for headers and footers when sizing scrolled lists.
const CHROME_LINES: usize = 10;
const MIN_LIST_LINES: usize = 5;
const MAX_NAME_WIDTH: usize = 40;

/// A run of text with one style.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub color: Option<Color>,
    pub bold: bool,
}

/// One screen row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::default().push(text, None)
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self::default().push(text, Some(color))
    }

    pub fn title(text: impl Into<String>, color: Color) -> Self {
        let mut line = Self::colored(text, color);
        line.spans[0].bold = true;
        line
    }

    pub fn push(mut self, text: impl Into<String>, color: Option<Color>) -> Self {
        self.spans.push(Span {
            text: text.into(),
            color,
            bold: false,
        });
        self
    }

    /// The unstyled text.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Render the current view.
pub fn render(app: &App) -> Vec<Line> {
    let theme = &app.settings().theme;
    if let Some(error) = app.error() {
        let mut lines: Vec<Line> = error.lines().map(|l| Line::colored(l, theme.error)).collect();
        lines.push(Line::default());
        lines.push(Line::colored("Press any key to continue...", theme.dim));
        return lines;
    }
    if app.show_help() {
        return help_view(app, theme);
    }
    match app.screen() {
        Screen::RemoteSelect => remote_select_view(app, theme),
        Screen::FileBrowser => file_browser_view(app, theme),
        Screen::QueueView => queue_view(app, theme),
        Screen::TransferView => transfer_view(app, theme),
    }
}

fn list_height(app: &App) -> usize {
    let rows = app.size().1 as usize;
    rows.saturating_sub(CHROME_LINES).max(MIN_LIST_LINES)
}

/// First index to show so that `cursor` stays on screen.
fn scroll_start(cursor: usize, height: usize) -> usize {
    if cursor >= height {
        cursor + 1 - height
    } else {
        0
    }
}

fn loading_line(app: &App, theme: &Theme, what: &str) -> Line {
    Line::colored(theme.spinner_frame(app.spinner()), theme.accent).push(format!(" {}", what), None)
}

fn row(text: String, highlighted: bool, color: Option<Color>, theme: &Theme) -> Line {
    if highlighted {
        let mut line = Line::colored(text, theme.cursor);
        line.spans[0].bold = true;
        line
    } else {
        Line::default().push(text, color)
    }
}

fn remote_select_view(app: &App, theme: &Theme) -> Vec<Line> {
    let mut lines = vec![Line::title("rfetch - Select Remote", theme.accent), Line::default()];

    if app.is_loading() {
        lines.push(loading_line(app, theme, "Loading remotes..."));
        return lines;
    }
    if app.remotes().is_empty() {
        lines.push(Line::plain("No remotes configured. Run 'rclone config' to add one."));
        return lines;
    }

    for (i, remote) in app.remotes().iter().enumerate() {
        let selected = i == app.remote_index();
        let marker = if selected { ">" } else { " " };
        lines.push(row(format!("{} {}", marker, remote), selected, None, theme));
    }

    lines.push(Line::default());
    lines.push(Line::colored("j/k: navigate • enter: select • r: refresh • ?: help • q: quit", theme.dim));
    lines
}

fn file_browser_view(app: &App, theme: &Theme) -> Vec<Line> {
    let browser = app.browser();
    let mut lines = vec![Line::title(
        crate::rclone::remote_spec(browser.remote(), browser.path()),
        theme.accent,
    )];

    let queued = app.queue().len();
    if queued > 0 {
        lines.push(Line::colored(format!("[{} items in queue]", queued), theme.success));
    }
    lines.push(Line::default());

    if app.is_loading() {
        lines.push(loading_line(app, theme, "Loading..."));
        return lines;
    }

    if browser.is_filtering() {
        lines.push(Line::colored("/ ", theme.warning).push(format!("{}_", browser.filter()), None));
        lines.push(Line::default());
    } else if !browser.filter().is_empty() {
        lines.push(Line::colored(format!("Filter: {}", browser.filter()), theme.warning));
        lines.push(Line::default());
    }

    let visible = browser.visible();
    if visible.is_empty() {
        if browser.filter().is_empty() {
            lines.push(Line::plain("Empty directory"));
        } else {
            lines.push(Line::plain("No matching files"));
        }
    } else {
        let height = list_height(app);
        let start = scroll_start(browser.cursor(), height);
        for (i, item) in visible.iter().enumerate().skip(start).take(height) {
            let mark = if item.selected {
                theme.selected_mark
            } else {
                theme.unselected_mark
            };
            let text = if item.file.is_dir {
                format!(" {} {}/", mark, item.file.name)
            } else {
                format!(" {} {}  {}", mark, item.file.name, format_size(item.file.byte_size()))
            };
            let color = item.file.is_dir.then_some(theme.directory);
            lines.push(row(text, i == browser.cursor(), color, theme));
        }
        if visible.len() > height {
            lines.push(Line::default());
            lines.push(Line::colored(
                format!("{}/{}", browser.cursor() + 1, visible.len()),
                theme.dim,
            ));
        }
    }

    lines.push(Line::default());
    lines.push(Line::colored(
        "j/k: navigate • space: select • a: all • l/enter: open • h: back • q: queue • /: filter • r: refresh",
        theme.dim,
    ));
    lines
}

fn queue_view(app: &App, theme: &Theme) -> Vec<Line> {
    let mut lines = vec![Line::title("Download Queue", theme.accent), Line::default()];

    let items = app.queue().items();
    if items.is_empty() {
        lines.push(Line::plain("Queue is empty"));
        lines.push(Line::default());
        lines.push(Line::colored("esc: go back", theme.dim));
        return lines;
    }

    let height = list_height(app);
    let start = scroll_start(app.queue_index(), height);
    for (i, item) in items.iter().enumerate().skip(start).take(height) {
        let text = if item.is_dir {
            format!(" {}/  [folder]  ({})", item.name, item.remote)
        } else {
            format!(" {}  {}  ({})", item.name, format_size(item.size), item.remote)
        };
        let color = match item.status {
            ItemStatus::Error => Some(theme.error),
            ItemStatus::Completed => Some(theme.success),
            _ => None,
        };
        lines.push(row(text, i == app.queue_index(), color, theme));
    }

    lines.push(Line::default());
    lines.push(Line::plain(format!(
        "Total: {} items, {}",
        items.len(),
        format_size(app.queue().total_size())
    )));
    lines.push(Line::default());
    lines.push(Line::colored(
        "j/k: navigate • d/x: remove • s: start download • esc: go back",
        theme.dim,
    ));
    lines
}

fn transfer_view(app: &App, theme: &Theme) -> Vec<Line> {
    let mut lines = vec![Line::title("Downloading...", theme.accent), Line::default()];

    let Some(manager) = app.transfers() else {
        lines.push(Line::plain("Initializing transfers..."));
        return lines;
    };

    let stats = manager.stats();
    lines.push(Line::plain(format!(
        "Pending: {} | Active: {} | Done: {} | Failed: {}",
        stats.pending, stats.in_progress, stats.completed, stats.failed
    )));
    lines.push(Line::default());

    let transfers = manager.get_all();
    if transfers.is_empty() {
        lines.push(Line::plain("No transfers in queue"));
        return lines;
    }

    let bar_width = (app.size().0 as usize).saturating_sub(25).clamp(20, 50);
    for status in [
        TransferStatus::InProgress,
        TransferStatus::Pending,
        TransferStatus::Completed,
        TransferStatus::Failed,
    ] {
        for t in transfers.iter().filter(|t| t.status == status) {
            lines.extend(transfer_lines(t, theme, bar_width));
        }
    }

    lines.push(Line::default());
    if stats.is_finished() {
        if stats.failed == 0 {
            lines.push(Line::colored("All downloads complete!", theme.success));
        } else {
            lines.push(Line::colored(
                format!("Downloads complete with {} error(s)", stats.failed),
                theme.error,
            ));
        }
        if let Some(outcome) = app.last_outcome().filter(|o| o.cancelled) {
            lines.push(Line::colored(
                format!("Batch cancelled, {} item(s) not started", outcome.skipped),
                theme.warning,
            ));
        }
        lines.push(Line::default());
        lines.push(Line::colored("enter: continue browsing • q: quit", theme.dim));
    } else {
        lines.push(Line::colored("Downloads in progress... ctrl+c: cancel", theme.dim));
    }
    lines
}

fn transfer_lines(t: &Transfer, theme: &Theme, bar_width: usize) -> Vec<Line> {
    let name = t.source.rsplit(['/', ':']).next().unwrap_or(&t.source);
    let name = truncate(name, MAX_NAME_WIDTH);
    let (tag, color) = match t.status {
        TransferStatus::Pending => ("[PENDING] ", None),
        TransferStatus::InProgress => ("[ACTIVE]  ", Some(theme.warning)),
        TransferStatus::Completed => ("[DONE]    ", Some(theme.success)),
        TransferStatus::Failed => ("[FAILED]  ", Some(theme.error)),
    };
    let mut lines = vec![Line::default().push(tag, color).push(name, color)];

    match t.status {
        TransferStatus::InProgress => {
            lines.push(
                Line::plain("   [")
                    .push(theme.progress_bar(t.progress, bar_width), Some(theme.success))
                    .push(format!("] {:.0}%", t.progress), None),
            );
            if t.bytes_total > 0 {
                let mut stats = format!(
                    "   {} / {}",
                    format_size(t.bytes_copied),
                    format_size(t.bytes_total)
                );
                if !t.speed.is_empty() {
                    stats.push_str(&format!(" @ {}", t.speed));
                }
                lines.push(Line::colored(stats, theme.dim));
            }
        }
        TransferStatus::Completed => {
            if let Some(elapsed) = t.elapsed() {
                let secs = elapsed.num_milliseconds() as f64 / 1000.0;
                lines.push(Line::colored(format!("   Completed in {:.1}s", secs), theme.dim));
            }
        }
        TransferStatus::Failed => {
            if let Some(error) = &t.error {
                lines.push(Line::colored(format!("   Error: {}", error), theme.error));
            }
        }
        TransferStatus::Pending => {}
    }
    lines
}

fn help_view(app: &App, theme: &Theme) -> Vec<Line> {
    let mut lines = vec![Line::title("Keys", theme.accent), Line::default()];
    for (key, help) in app.settings().keys.help_rows() {
        lines.push(Line::colored(format!("  {:<16}", key), theme.cursor).push(help, None));
    }
    lines.push(Line::default());
    lines.push(Line::colored("press any key to close", theme.dim));
    lines
}

/// Cut `text` to at most `width` display columns, marking the cut with `...`.
pub fn truncate(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    let budget = width.saturating_sub(3);
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

fn display_width(text: &str) -> usize {
    text.chars().map(|c| c.width().unwrap_or(0)).sum()
}

/// Write `lines` to the terminal, clipped to `width` x `height`.
pub fn draw<W: Write>(out: &mut W, lines: &[Line], width: u16, height: u16) -> io::Result<()> {
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    for (y, line) in lines.iter().take(height as usize).enumerate() {
        queue!(out, MoveTo(0, y as u16))?;
        let mut remaining = width as usize;
        for span in &line.spans {
            if remaining == 0 {
                break;
            }
            let mut text = String::new();
            for c in span.text.chars() {
                let w = c.width().unwrap_or(0);
                if w > remaining {
                    remaining = 0;
                    break;
                }
                remaining -= w;
                text.push(c);
            }
            if span.bold {
                queue!(out, SetAttribute(Attribute::Bold))?;
            }
            if let Some(color) = span.color {
                queue!(out, SetForegroundColor(color))?;
            }
            queue!(out, Print(text), ResetColor, SetAttribute(Attribute::Reset))?;
        }
    }
    out.flush()
}
