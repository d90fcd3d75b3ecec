// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Directory browser state for one remote.

use crate::rclone::{join_path, FileItem};
use crate::utils::contains_ignore_case;

/// A listing entry with its selection flag.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserItem {
    pub file: FileItem,
    pub selected: bool,
}

impl From<FileItem> for BrowserItem {
    fn from(file: FileItem) -> Self {
        Self {
            file,
            selected: false,
        }
    }
}

/// Current remote, path, listing, cursor and filter.
///
/// The cursor indexes the *filtered* listing. Selection flags live on the
/// unfiltered entries and are located by path, so toggling through a filter
/// hits the right entry. The root path is the empty string.
#[derive(Debug, Clone, Default)]
pub struct Browser {
    remote: String,
    path: String,
    history: Vec<String>,
    items: Vec<BrowserItem>,
    cursor: usize,
    filter: String,
    filter_mode: bool,
}

impl Browser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start browsing `remote` at its root.
    pub fn open(&mut self, remote: impl Into<String>) {
        *self = Self {
            remote: remote.into(),
            ..Self::default()
        };
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of parent paths on the back-stack.
    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// Replace the listing. Selection is reset and the cursor is kept but
    /// clamped, so a refresh leaves it where it was.
    pub fn set_items(&mut self, files: Vec<FileItem>) {
        self.items = files.into_iter().map(BrowserItem::from).collect();
        self.clamp_cursor();
    }

    /// Every entry, ignoring the filter.
    pub fn items(&self) -> &[BrowserItem] {
        &self.items
    }

    /// Entries matching the filter, in listing order.
    pub fn visible(&self) -> Vec<&BrowserItem> {
        self.items
            .iter()
            .filter(|i| contains_ignore_case(&i.file.name, &self.filter))
            .collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The visible entry under the cursor.
    pub fn current(&self) -> Option<&BrowserItem> {
        self.visible().get(self.cursor).copied()
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.visible().len() {
            self.cursor += 1;
        }
    }

    /// Descend into `name`, pushing the current path onto the back-stack.
    pub fn enter(&mut self, name: &str) {
        let next = join_path(&self.path, name);
        self.history.push(std::mem::replace(&mut self.path, next));
        self.reset_view();
    }

    /// Return to the parent path. `false` when already at the top of the
    /// back-stack.
    pub fn back(&mut self) -> bool {
        match self.history.pop() {
            Some(parent) => {
                self.path = parent;
                self.reset_view();
                true
            }
            None => false,
        }
    }

    /// Flip the selection flag of the entry under the cursor.
    pub fn toggle_current(&mut self) {
        let Some(path) = self.current().map(|i| i.file.path.clone()) else {
            return;
        };
        if let Some(item) = self.items.iter_mut().find(|i| i.file.path == path) {
            item.selected = !item.selected;
        }
    }

    /// Select every visible entry, or deselect them all if they already are.
    pub fn toggle_all_visible(&mut self) {
        let visible = self.visible();
        let all_selected = visible.iter().all(|i| i.selected);
        let paths: Vec<String> = visible.iter().map(|i| i.file.path.clone()).collect();
        for item in self.items.iter_mut().filter(|i| paths.contains(&i.file.path)) {
            item.selected = !all_selected;
        }
    }

    pub fn selected_count(&self) -> usize {
        self.items.iter().filter(|i| i.selected).count()
    }

    /// Take every selected entry (filtered or not) and clear all flags.
    pub fn take_selected(&mut self) -> Vec<FileItem> {
        let taken = self
            .items
            .iter()
            .filter(|i| i.selected)
            .map(|i| i.file.clone())
            .collect();
        for item in &mut self.items {
            item.selected = false;
        }
        taken
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn is_filtering(&self) -> bool {
        self.filter_mode
    }

    pub fn start_filter(&mut self) {
        self.filter_mode = true;
    }

    pub fn push_filter(&mut self, c: char) {
        self.filter.push(c);
        self.cursor = 0;
    }

    pub fn pop_filter(&mut self) {
        self.filter.pop();
        self.cursor = 0;
    }

    /// Leave filter mode keeping the typed text.
    pub fn commit_filter(&mut self) {
        self.filter_mode = false;
        self.cursor = 0;
    }

    /// Leave filter mode and drop the text.
    pub fn cancel_filter(&mut self) {
        self.filter_mode = false;
        self.clear_filter();
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
        self.cursor = 0;
    }

    fn reset_view(&mut self) {
        self.cursor = 0;
        self.filter.clear();
        self.filter_mode = false;
    }

    fn clamp_cursor(&mut self) {
        let len = self.visible().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Vec<FileItem> {
        vec![
            FileItem::dir("Photos", "Photos"),
            FileItem::file("notes.txt", "notes.txt", 10),
            FileItem::file("photo-index.csv", "photo-index.csv", 20),
            FileItem::file("report.pdf", "report.pdf", 30),
        ]
    }

    fn browser() -> Browser {
        let mut b = Browser::new();
        b.open("gdrive");
        b.set_items(listing());
        b
    }

    #[test]
    fn test_descend_and_back_restore_root() {
        let mut b = browser();
        assert_eq!(b.path(), "");
        b.enter("Photos");
        assert_eq!(b.path(), "Photos");
        b.enter("2024");
        assert_eq!(b.path(), "Photos/2024");
        assert_eq!(b.depth(), 2);

        assert!(b.back());
        assert_eq!(b.path(), "Photos");
        assert!(b.back());
        assert_eq!(b.path(), "");
        assert!(!b.back());
        assert_eq!(b.path(), "");
    }

    #[test]
    fn test_cursor_is_clamped() {
        let mut b = browser();
        b.move_up();
        assert_eq!(b.cursor(), 0);
        for _ in 0..10 {
            b.move_down();
        }
        assert_eq!(b.cursor(), 3);
        b.set_items(listing()[..2].to_vec());
        assert_eq!(b.cursor(), 1);
        b.set_items(Vec::new());
        assert_eq!(b.cursor(), 0);
        assert!(b.current().is_none());
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let mut b = browser();
        b.start_filter();
        for c in "PHOTO".chars() {
            b.push_filter(c);
        }
        let names: Vec<&str> = b.visible().iter().map(|i| i.file.name.as_str()).collect();
        assert_eq!(names, vec!["Photos", "photo-index.csv"]);
    }

    #[test]
    fn test_toggle_through_filter_hits_right_entry() {
        let mut b = browser();
        b.push_filter('r');
        b.push_filter('e');
        b.push_filter('p');
        assert_eq!(b.current().unwrap().file.name, "report.pdf");
        b.toggle_current();
        b.clear_filter();
        let selected: Vec<&str> = b
            .items()
            .iter()
            .filter(|i| i.selected)
            .map(|i| i.file.name.as_str())
            .collect();
        assert_eq!(selected, vec!["report.pdf"]);
    }

    #[test]
    fn test_toggle_all_visible_is_binary() {
        let mut b = browser();
        b.move_down();
        b.toggle_current();
        b.toggle_all_visible();
        assert_eq!(b.selected_count(), 4);
        b.toggle_all_visible();
        assert_eq!(b.selected_count(), 0);

        b.push_filter('p');
        b.push_filter('h');
        b.toggle_all_visible();
        assert_eq!(b.selected_count(), 2);
    }

    #[test]
    fn test_take_selected_clears_flags() {
        let mut b = browser();
        b.toggle_current();
        b.move_down();
        b.move_down();
        b.toggle_current();
        let taken = b.take_selected();
        assert_eq!(taken.len(), 2);
        assert!(taken[0].is_dir);
        assert_eq!(b.selected_count(), 0);
    }

    #[test]
    fn test_filter_commit_and_cancel() {
        let mut b = browser();
        b.start_filter();
        b.push_filter('x');
        b.pop_filter();
        b.push_filter('n');
        b.commit_filter();
        assert!(!b.is_filtering());
        assert_eq!(b.filter(), "n");

        b.start_filter();
        b.push_filter('o');
        b.cancel_filter();
        assert_eq!(b.filter(), "");
        assert_eq!(b.visible().len(), 4);
    }

    #[test]
    fn test_enter_clears_filter() {
        let mut b = browser();
        b.push_filter('p');
        b.enter("Photos");
        assert_eq!(b.filter(), "");
        assert_eq!(b.cursor(), 0);
    }

    #[test]
    fn test_open_resets_history() {
        let mut b = browser();
        b.enter("Photos");
        b.open("s3");
        assert_eq!(b.remote(), "s3");
        assert_eq!(b.path(), "");
        assert_eq!(b.depth(), 0);
        assert!(b.items().is_empty());
    }
}
