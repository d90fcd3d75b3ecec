// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Adapter for the external `rclone` binary.
//!
//! rfetch never talks to storage itself. Everything goes through three
//! subprocess invocations:
//!
//! - `rclone listremotes` for the remote picker
//! - `rclone lsjson <remote>:<path>` for directory listings
//! - `rclone copy -v --stats <interval> <remote>:<path> <dir>` for transfers,
//!   whose stderr is decoded by [`crate::transfer::progress`]

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::process::Command;

/// Default binary name, resolved through `PATH`.
pub const DEFAULT_BINARY: &str = "rclone";

/// Default interval between `Transferred:` stats lines.
pub const DEFAULT_STATS_INTERVAL: &str = "500ms";

/// One entry of an `lsjson` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileItem {
    #[serde(rename = "Name")]
    pub name: String,
    /// Path relative to the browsing root (rewritten after listing).
    #[serde(rename = "Path")]
    pub path: String,
    /// Size in bytes; rclone reports `-1` for directories and unknown sizes.
    #[serde(rename = "Size", default)]
    pub size: i64,
    #[serde(rename = "IsDir", default)]
    pub is_dir: bool,
    #[serde(rename = "ModTime", default)]
    pub mod_time: String,
}

impl FileItem {
    /// Create a plain file entry (mostly useful in tests).
    pub fn file(name: impl Into<String>, path: impl Into<String>, size: i64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size,
            is_dir: false,
            mod_time: String::new(),
        }
    }

    /// Create a directory entry.
    pub fn dir(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size: -1,
            is_dir: true,
            mod_time: String::new(),
        }
    }

    /// Size in bytes with unknown (negative) sizes counted as zero.
    pub fn byte_size(&self) -> u64 {
        self.size.max(0) as u64
    }
}

/// Build the `remote:path` descriptor rclone expects.
pub fn remote_spec(remote: &str, path: &str) -> String {
    format!("{}:{}", remote, path)
}

/// Join a listing entry name onto the current browsing path.
///
/// The root path is the empty string, so `join_path("", "a")` is `"a"`.
pub fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

/// Parse `listremotes` output into bare remote names.
pub fn parse_remotes(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.strip_suffix(':').unwrap_or(line).to_string())
        .collect()
}

/// Parse `lsjson` output and rewrite each entry's path relative to the
/// browsing root.
pub fn parse_listing(json: &[u8], path: &str) -> Result<Vec<FileItem>> {
    let mut items: Vec<FileItem> =
        serde_json::from_slice(json).context("Failed to parse file list")?;
    for item in &mut items {
        item.path = join_path(path, &item.name);
    }
    Ok(items)
}

/// Handle for invoking the rclone binary.
#[derive(Debug, Clone)]
pub struct RcloneClient {
    binary: PathBuf,
    stats_interval: String,
}

impl Default for RcloneClient {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY, DEFAULT_STATS_INTERVAL)
    }
}

impl RcloneClient {
    /// Create a client for the given binary and stats interval.
    pub fn new(binary: impl Into<PathBuf>, stats_interval: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            stats_interval: stats_interval.into(),
        }
    }

    /// Path or name of the binary being invoked.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// List configured remotes.
    pub async fn list_remotes(&self) -> Result<Vec<String>> {
        let stdout = self
            .run_captured(&["listremotes"])
            .await
            .context("Failed to list remotes")?;
        let remotes = parse_remotes(&String::from_utf8_lossy(&stdout));
        tracing::debug!(count = remotes.len(), "listed remotes");
        Ok(remotes)
    }

    /// List the entries directly under `remote:path`.
    pub async fn list_files(&self, remote: &str, path: &str) -> Result<Vec<FileItem>> {
        let target = remote_spec(remote, path);
        let stdout = self
            .run_captured(&["lsjson", &target])
            .await
            .with_context(|| format!("Failed to list files at {}", target))?;
        let items = parse_listing(&stdout, path)?;
        tracing::debug!(location = %target, count = items.len(), "listed files");
        Ok(items)
    }

    /// Build the copy command for one transfer.
    ///
    /// stderr is piped for progress decoding; the child is killed if its
    /// handle is dropped so that cancelling a batch never leaks a process.
    pub fn copy_command(&self, source: &str, destination: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("copy")
            .arg("-v")
            .arg("--stats")
            .arg(&self.stats_interval)
            .arg(source)
            .arg(destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Run a short-lived command and return its stdout.
    async fn run_captured(&self, args: &[&str]) -> Result<Vec<u8>> {
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            if detail.is_empty() {
                bail!("{} exited with {}", self.binary.display(), output.status);
            }
            bail!("{} exited with {}: {}", self.binary.display(), output.status, detail);
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remotes_strips_colons_and_blanks() {
        let out = "gdrive:\ns3-backup:\n\n  photos:  \n";
        assert_eq!(parse_remotes(out), vec!["gdrive", "s3-backup", "photos"]);
        assert!(parse_remotes("").is_empty());
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "docs"), "docs");
        assert_eq!(join_path("docs", "2024"), "docs/2024");
    }

    #[test]
    fn test_parse_listing_rewrites_paths() {
        let json = br#"[
            {"Path":"a.txt","Name":"a.txt","Size":100,"MimeType":"text/plain","ModTime":"2024-01-01T00:00:00Z","IsDir":false},
            {"Path":"sub","Name":"sub","Size":-1,"ModTime":"2024-01-01T00:00:00Z","IsDir":true}
        ]"#;
        let items = parse_listing(json, "docs").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].path, "docs/a.txt");
        assert_eq!(items[0].byte_size(), 100);
        assert_eq!(items[1].path, "docs/sub");
        assert!(items[1].is_dir);
        assert_eq!(items[1].byte_size(), 0);

        let root = parse_listing(json, "").unwrap();
        assert_eq!(root[0].path, "a.txt");
    }

    #[test]
    fn test_parse_listing_rejects_garbage() {
        let err = parse_listing(b"not json", "").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse file list"));
    }

    #[test]
    fn test_copy_command_arguments() {
        let client = RcloneClient::new("/opt/rclone", "1s");
        let cmd = client.copy_command("gdrive:a.txt", Path::new("/tmp/out"));
        let std_cmd = cmd.as_std();
        assert_eq!(std_cmd.get_program(), "/opt/rclone");
        let args: Vec<_> = std_cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["copy", "-v", "--stats", "1s", "gdrive:a.txt", "/tmp/out"]);
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let client = RcloneClient::new("/nonexistent/rfetch-test-rclone", "500ms");
        let err = client.list_remotes().await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to list remotes"));
    }
}
