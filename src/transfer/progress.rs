// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Decoder for the copy tool's diagnostic stream.
//!
//! With `-v --stats <interval>` rclone periodically prints a stats block to
//! stderr. The line we care about looks like
//!
//! ```text
//! Transferred:   1.234 GiB / 5.678 GiB, 22%, 10 MiB/s, ETA 1m30s
//! ```
//!
//! The tool rewrites lines in place with a bare `\r`, so `\r`, `\n` and
//! `\r\n` are all line terminators here and empty lines are dropped.
//! Lines that do not match are ignored; a malformed number decodes as zero.
//! Nothing in this module returns a decoding error.

use std::sync::LazyLock;

use regex::Regex;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Longest line kept in the splitter buffer before it is discarded.
const MAX_LINE_BYTES: usize = 1024 * 1024;

const READ_CHUNK: usize = 8 * 1024;

/// Two `<number> <unit>` pairs followed by an integer percentage. A unit must
/// be present, which keeps the file-count line (`Transferred: 0 / 1, 0%`)
/// from being mistaken for byte progress.
static STATS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Transferred:\s+([0-9.]+)\s*([kKMGTP]i?[Bb]?|[Bb])\s*/\s*([0-9.]+)\s*([kKMGTP]i?[Bb]?|[Bb]),\s*([0-9]+)%",
    )
    .expect("Stats line regex is valid")
});

/// One decoded `Transferred:` line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub percentage: f64,
    pub bytes_copied: u64,
    pub bytes_total: u64,
}

/// Convert a number and a binary unit (`GiB`, `MB`, `k`, `B`...) into bytes.
///
/// Both `XiB` and `XB` spellings map to 1024-based multipliers. An unknown or
/// empty unit counts as bytes; an unparseable number yields zero.
pub fn parse_size(value: &str, unit: &str) -> u64 {
    let Ok(value) = value.trim().parse::<f64>() else {
        return 0;
    };

    let unit = unit.trim().to_uppercase();
    let unit = unit.strip_suffix('B').unwrap_or(&unit);
    let unit = unit.strip_suffix('I').unwrap_or(unit);

    let multiplier: u64 = match unit {
        "K" => 1 << 10,
        "M" => 1 << 20,
        "G" => 1 << 30,
        "T" => 1 << 40,
        "P" => 1 << 50,
        _ => 1,
    };

    (value * multiplier as f64) as u64
}

/// Decode a single line. Returns `None` for anything that is not a byte
/// progress line.
pub fn parse_progress_line(line: &str) -> Option<ProgressUpdate> {
    let caps = STATS_PATTERN.captures(line)?;
    let percentage = caps[5].parse::<f64>().unwrap_or(0.0);
    Some(ProgressUpdate {
        percentage,
        bytes_copied: parse_size(&caps[1], &caps[2]),
        bytes_total: parse_size(&caps[3], &caps[4]),
    })
}

/// Split a complete chunk of text on `\r`, `\n` and `\r\n`, dropping empty lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split(['\r', '\n']).filter(|l| !l.is_empty()).collect()
}

/// Incremental line splitter for a byte stream.
///
/// A `\r\n` pair split across two chunks produces an empty line between the
/// halves, which is dropped like any other empty line.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buf: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\r' || byte == b'\n' {
                self.flush_into(&mut lines);
            } else if self.buf.len() < MAX_LINE_BYTES {
                self.buf.push(byte);
            }
        }
        lines
    }

    /// Return the trailing unterminated line, if any.
    pub fn finish(mut self) -> Option<String> {
        let mut lines = Vec::new();
        self.flush_into(&mut lines);
        lines.pop()
    }

    fn flush_into(&mut self, lines: &mut Vec<String>) {
        if !self.buf.is_empty() {
            lines.push(String::from_utf8_lossy(&self.buf).into_owned());
            self.buf.clear();
        }
    }
}

/// Read `reader` to EOF, calling `on_update` for every decoded progress line
/// in stream order.
///
/// Returns the last non-empty line that was not a progress line. rclone
/// prints its error there when a copy fails, so it makes a useful failure
/// detail.
pub async fn forward_progress<R, F>(mut reader: R, mut on_update: F) -> std::io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
    F: FnMut(ProgressUpdate),
{
    let mut splitter = LineSplitter::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut last_other: Option<String> = None;

    let mut handle = |line: String, last_other: &mut Option<String>| {
        match parse_progress_line(&line) {
            Some(update) => on_update(update),
            None => {
                let trimmed = line.trim();
                if !trimmed.is_empty() && !is_stats_noise(trimmed) {
                    *last_other = Some(trimmed.to_string());
                }
            }
        }
    };

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        for line in splitter.push(&chunk[..n]) {
            handle(line, &mut last_other);
        }
    }
    if let Some(line) = splitter.finish() {
        handle(line, &mut last_other);
    }

    Ok(last_other)
}

/// Lines of the periodic stats block that carry no error information.
fn is_stats_noise(line: &str) -> bool {
    const PREFIXES: [&str; 7] = [
        "Transferred:",
        "Errors:",
        "Checks:",
        "Elapsed time:",
        "Transferring:",
        "Renamed:",
        "Deleted:",
    ];
    PREFIXES.iter().any(|p| line.starts_with(p)) || line.starts_with('*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference_line() {
        let update =
            parse_progress_line("Transferred:   1.234 GiB / 5.678 GiB, 22%, 10 MiB/s, ETA 1m30s")
                .unwrap();
        assert_eq!(update.percentage, 22.0);
        assert_eq!(update.bytes_copied, (1.234f64 * 1073741824.0) as u64);
        assert_eq!(update.bytes_copied, 1_324_997_410);
        assert_eq!(update.bytes_total, 6_096_706_076);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let line = "Transferred:   1.234 GiB / 5.678 GiB, 22%, 10 MiB/s, ETA 1m30s";
        assert_eq!(parse_progress_line(line), parse_progress_line(line));
    }

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("1", "KiB"), 1024);
        assert_eq!(parse_size("1", "KB"), 1024);
        assert_eq!(parse_size("1", "k"), 1024);
        assert_eq!(parse_size("2", "MiB"), 2 * 1024 * 1024);
        assert_eq!(parse_size("1", "TiB"), 1 << 40);
        assert_eq!(parse_size("1", "PB"), 1 << 50);
        assert_eq!(parse_size("512", "B"), 512);
        assert_eq!(parse_size("1.5", "GiB"), 1_610_612_736);
    }

    #[test]
    fn test_malformed_number_decodes_as_zero() {
        assert_eq!(parse_size("1.2.3", "GiB"), 0);
        let update = parse_progress_line("Transferred:   1.2.3 GiB / 2 GiB, 10%").unwrap();
        assert_eq!(update.bytes_copied, 0);
        assert_eq!(update.bytes_total, 2 << 30);
        assert_eq!(update.percentage, 10.0);
    }

    #[test]
    fn test_bare_byte_unit() {
        let update = parse_progress_line("Transferred:   0 B / 1.5 KiB, 0%, 0 B/s, ETA -").unwrap();
        assert_eq!(update.bytes_copied, 0);
        assert_eq!(update.bytes_total, 1536);
    }

    #[test]
    fn test_non_matching_lines() {
        assert!(parse_progress_line("Transferred:            0 / 1, 0%").is_none());
        assert!(parse_progress_line("Transferred:   0 B / 0 B, -, 0 B/s, ETA -").is_none());
        assert!(parse_progress_line("2024/01/01 INFO  : a.txt: Copied (new)").is_none());
        assert!(parse_progress_line("").is_none());
    }

    #[test]
    fn test_split_mixed_delimiters() {
        let text = "progress\rline one\nTransferred:   0.0 GiB / 1.0 GiB, 0%\r\n";
        assert_eq!(
            split_lines(text),
            vec!["progress", "line one", "Transferred:   0.0 GiB / 1.0 GiB, 0%"]
        );
        assert!(split_lines("\r\n\r\n").is_empty());
    }

    #[test]
    fn test_splitter_across_chunks() {
        let mut splitter = LineSplitter::new();
        let mut lines = splitter.push(b"progress\rline ");
        lines.extend(splitter.push(b"one\r"));
        lines.extend(splitter.push(b"\nTransferred:   0.0 GiB / 1.0 GiB, 0%"));
        assert_eq!(lines, vec!["progress", "line one"]);
        assert_eq!(
            splitter.finish().as_deref(),
            Some("Transferred:   0.0 GiB / 1.0 GiB, 0%")
        );
    }

    #[tokio::test]
    async fn test_forward_progress_in_order() {
        let stream: &[u8] = b"2024/01/01 INFO  : Starting\n\
            Transferred:   10 MiB / 100 MiB, 10%, 1 MiB/s, ETA 90s\r\
            Transferred:   50 MiB / 100 MiB, 50%, 1 MiB/s, ETA 50s\r\n\
            Errors:                 0\n\
            Transferred:   100 MiB / 100 MiB, 100%, 1 MiB/s, ETA 0s";

        let mut seen = Vec::new();
        let last = forward_progress(stream, |u| seen.push(u.percentage)).await.unwrap();

        assert_eq!(seen, vec![10.0, 50.0, 100.0]);
        assert_eq!(last.as_deref(), Some("2024/01/01 INFO  : Starting"));
    }

    #[tokio::test]
    async fn test_forward_progress_captures_error_line() {
        let stream: &[u8] = b"Transferred:   0 B / 1 KiB, 0%\n\
            2024/01/01 ERROR : a.txt: Failed to copy: permission denied\n\
            Errors:                 1 (retrying may help)\n";
        let last = forward_progress(stream, |_| {}).await.unwrap();
        assert_eq!(
            last.as_deref(),
            Some("2024/01/01 ERROR : a.txt: Failed to copy: permission denied")
        );
    }
}
