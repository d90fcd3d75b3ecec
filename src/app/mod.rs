// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Application state machine.
//!
//! ```text
//! RemoteSelect ─▶ FileBrowser ⇄ QueueView ─▶ TransferView ─▶ FileBrowser
//! ```
//!
//! [`App::update`] is the only place state changes. It is synchronous and
//! never touches the terminal or a subprocess; anything slow is returned as a
//! [`Command`] for the event loop to run, and its result comes back as an
//! [`AppEvent`]. The queue and the transfer registry are the only values
//! shared with background tasks.

pub mod browser;
pub mod event;
pub mod keys;

pub use browser::{Browser, BrowserItem};
pub use event::{AppEvent, Command, TransferBatch};
pub use keys::{Action, Binding, KeyMap, KeyPress};

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::error::{listing_error, remotes_error};
use crate::queue::Queue;
use crate::rclone::remote_spec;
use crate::transfer::{transfer_id, BatchOutcome, TransferManager, TransferStats};

/// Which view is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    RemoteSelect,
    FileBrowser,
    QueueView,
    TransferView,
}

/// Session state.
#[derive(Debug)]
pub struct App {
    settings: Settings,
    screen: Screen,

    remotes: Vec<String>,
    remote_index: usize,

    browser: Browser,

    queue: Arc<Queue>,
    queue_index: usize,

    transfers: Option<Arc<TransferManager>>,
    cancel: Option<CancellationToken>,
    last_outcome: Option<BatchOutcome>,

    loading: bool,
    spinner: usize,
    tick_scheduled: bool,
    error: Option<String>,
    show_help: bool,
    size: (u16, u16),
    quitting: bool,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            screen: Screen::RemoteSelect,
            remotes: Vec::new(),
            remote_index: 0,
            browser: Browser::new(),
            queue: Arc::new(Queue::new()),
            queue_index: 0,
            transfers: None,
            cancel: None,
            last_outcome: None,
            loading: false,
            spinner: 0,
            tick_scheduled: false,
            error: None,
            show_help: false,
            size: (80, 24),
            quitting: false,
        }
    }

    /// Commands to run at startup: enumerate remotes.
    pub fn init(&mut self) -> Vec<Command> {
        self.begin_load(Command::LoadRemotes)
    }

    /// Apply one event and return the side effects it requires.
    pub fn update(&mut self, event: AppEvent) -> Vec<Command> {
        match event {
            AppEvent::Key(key) => self.on_key(key),
            AppEvent::RemotesLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(remotes) => {
                        tracing::debug!(count = remotes.len(), "remotes loaded");
                        self.remotes = remotes;
                        self.remote_index = self.remote_index.min(self.remotes.len().saturating_sub(1));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to list remotes");
                        self.error = Some(remotes_error(&e));
                    }
                }
                Vec::new()
            }
            AppEvent::FilesLoaded {
                remote,
                path,
                result,
            } => {
                if remote != self.browser.remote() || path != self.browser.path() {
                    tracing::debug!(remote = %remote, path = %path, "discarding stale listing");
                    return Vec::new();
                }
                self.loading = false;
                match result {
                    Ok(files) => {
                        tracing::debug!(remote = %remote, path = %path, count = files.len(), "listing loaded");
                        self.browser.set_items(files);
                    }
                    Err(e) => {
                        tracing::warn!(remote = %remote, path = %path, error = %e, "failed to list files");
                        self.error = Some(listing_error(&remote_spec(&remote, &path), &e));
                    }
                }
                Vec::new()
            }
            AppEvent::BatchFinished(outcome) => {
                self.last_outcome = Some(outcome);
                Vec::new()
            }
            AppEvent::Tick => self.on_tick(),
            AppEvent::Resize(width, height) => {
                self.size = (width, height);
                Vec::new()
            }
        }
    }

    fn on_tick(&mut self) -> Vec<Command> {
        self.tick_scheduled = false;
        if self.loading {
            self.spinner = self.spinner.wrapping_add(1);
            return self.schedule_tick();
        }
        if self.screen == Screen::TransferView && !self.transfer_stats().is_finished() {
            return self.schedule_tick();
        }
        Vec::new()
    }

    fn on_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if self.settings.keys.matches(Action::Quit, &key) {
            return self.quit();
        }
        if self.error.take().is_some() {
            return Vec::new();
        }
        if self.show_help {
            self.show_help = false;
            return Vec::new();
        }
        if self.loading {
            return Vec::new();
        }
        let filtering = self.screen == Screen::FileBrowser && self.browser.is_filtering();
        if !filtering && self.settings.keys.matches(Action::Help, &key) {
            self.show_help = true;
            return Vec::new();
        }

        match self.screen {
            Screen::RemoteSelect => self.on_remote_select_key(&key),
            Screen::FileBrowser if filtering => {
                self.on_filter_key(&key);
                Vec::new()
            }
            Screen::FileBrowser => self.on_browser_key(&key),
            Screen::QueueView => self.on_queue_key(&key),
            Screen::TransferView => self.on_transfer_key(&key),
        }
    }

    fn on_remote_select_key(&mut self, key: &KeyEvent) -> Vec<Command> {
        let keys = &self.settings.keys;
        if keys.matches(Action::Up, key) {
            self.remote_index = self.remote_index.saturating_sub(1);
        } else if keys.matches(Action::Down, key) {
            if self.remote_index + 1 < self.remotes.len() {
                self.remote_index += 1;
            }
        } else if keys.matches_any(&[Action::Enter, Action::Right], key) {
            if let Some(remote) = self.remotes.get(self.remote_index).cloned() {
                tracing::debug!(remote = %remote, "opening remote");
                self.browser.open(remote);
                self.screen = Screen::FileBrowser;
                return self.load_current_dir();
            }
        } else if keys.matches(Action::Refresh, key) {
            return self.begin_load(Command::LoadRemotes);
        } else if keys.matches(Action::Queue, key) {
            // q leaves from the remote list
            return self.quit();
        }
        Vec::new()
    }

    fn on_filter_key(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Esc => self.browser.cancel_filter(),
            KeyCode::Enter => self.browser.commit_filter(),
            KeyCode::Backspace => self.browser.pop_filter(),
            KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                self.browser.push_filter(c)
            }
            _ => {}
        }
    }

    fn on_browser_key(&mut self, key: &KeyEvent) -> Vec<Command> {
        let keys = &self.settings.keys;
        if keys.matches(Action::Up, key) {
            self.browser.move_up();
        } else if keys.matches(Action::Down, key) {
            self.browser.move_down();
        } else if keys.matches_any(&[Action::Enter, Action::Right], key) {
            let Some(item) = self.browser.current().map(|i| i.file.clone()) else {
                return Vec::new();
            };
            if item.is_dir {
                self.browser.enter(&item.name);
                return self.load_current_dir();
            }
            self.queue.add(self.browser.remote(), &item);
        } else if keys.matches_any(&[Action::Left, Action::Back], key) {
            if self.browser.back() {
                return self.load_current_dir();
            }
            self.screen = Screen::RemoteSelect;
            self.remote_index = 0;
        } else if keys.matches(Action::Select, key) {
            self.browser.toggle_current();
        } else if keys.matches(Action::SelectAll, key) {
            self.browser.toggle_all_visible();
        } else if keys.matches(Action::Filter, key) {
            self.browser.start_filter();
        } else if keys.matches(Action::Escape, key) {
            if !self.browser.filter().is_empty() {
                self.browser.clear_filter();
            }
        } else if keys.matches(Action::Refresh, key) {
            return self.load_current_dir();
        } else if keys.matches(Action::Queue, key) {
            let remote = self.browser.remote().to_string();
            for file in self.browser.take_selected() {
                self.queue.add(&remote, &file);
            }
            if !self.queue.is_empty() {
                self.screen = Screen::QueueView;
                self.queue_index = 0;
            }
        }
        Vec::new()
    }

    fn on_queue_key(&mut self, key: &KeyEvent) -> Vec<Command> {
        let keys = &self.settings.keys;
        let len = self.queue.len();
        if keys.matches(Action::Up, key) {
            self.queue_index = self.queue_index.saturating_sub(1);
        } else if keys.matches(Action::Down, key) {
            if self.queue_index + 1 < len {
                self.queue_index += 1;
            }
        } else if keys.matches(Action::Remove, key) {
            if len > 0 {
                self.queue.remove(self.queue_index);
                self.queue_index = self.queue_index.min(self.queue.len().saturating_sub(1));
            }
        } else if keys.matches_any(&[Action::Escape, Action::Back], key) {
            self.screen = Screen::FileBrowser;
            self.queue_index = 0;
        } else if keys.matches(Action::Start, key) && len > 0 {
            return self.start_transfers();
        }
        Vec::new()
    }

    fn on_transfer_key(&mut self, key: &KeyEvent) -> Vec<Command> {
        if !self.transfer_stats().is_finished() {
            return Vec::new();
        }
        let keys = &self.settings.keys;
        if keys.matches(Action::Enter, key) {
            self.queue.clear();
            self.transfers = None;
            self.cancel = None;
            self.last_outcome = None;
            self.queue_index = 0;
            self.screen = Screen::FileBrowser;
        } else if keys.matches(Action::Queue, key) {
            return self.quit();
        }
        Vec::new()
    }

    fn start_transfers(&mut self) -> Vec<Command> {
        let items = self.queue.items();
        let destination = self.settings.destination.clone();
        let manager = Arc::new(TransferManager::new());
        for (index, item) in items.iter().enumerate() {
            manager.add(transfer_id(index), item.source(), destination.clone(), item.size);
        }
        let cancel = CancellationToken::new();

        tracing::info!(items = items.len(), destination = %destination.display(), "starting downloads");
        self.transfers = Some(Arc::clone(&manager));
        self.cancel = Some(cancel.clone());
        self.last_outcome = None;
        self.screen = Screen::TransferView;

        let mut commands = vec![Command::RunTransfers(TransferBatch {
            items,
            manager,
            queue: Arc::clone(&self.queue),
            cancel,
            destination,
        })];
        commands.extend(self.schedule_tick());
        commands
    }

    fn load_current_dir(&mut self) -> Vec<Command> {
        let remote = self.browser.remote().to_string();
        let path = self.browser.path().to_string();
        self.begin_load(Command::LoadFiles { remote, path })
    }

    fn begin_load(&mut self, load: Command) -> Vec<Command> {
        self.loading = true;
        let mut commands = vec![load];
        commands.extend(self.schedule_tick());
        commands
    }

    fn schedule_tick(&mut self) -> Vec<Command> {
        if self.tick_scheduled {
            return Vec::new();
        }
        self.tick_scheduled = true;
        vec![Command::ScheduleTick]
    }

    fn quit(&mut self) -> Vec<Command> {
        if let Some(cancel) = &self.cancel {
            tracing::info!("cancelling running transfers");
            cancel.cancel();
        }
        self.quitting = true;
        vec![Command::Quit]
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn remotes(&self) -> &[String] {
        &self.remotes
    }

    pub fn remote_index(&self) -> usize {
        self.remote_index
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    pub fn queue(&self) -> &Arc<Queue> {
        &self.queue
    }

    pub fn queue_index(&self) -> usize {
        self.queue_index
    }

    /// The active transfer registry, present from batch start until the
    /// user returns to browsing.
    pub fn transfers(&self) -> Option<&Arc<TransferManager>> {
        self.transfers.as_ref()
    }

    /// Stats of the active registry; all zero when there is none.
    pub fn transfer_stats(&self) -> TransferStats {
        self.transfers
            .as_ref()
            .map(|m| m.stats())
            .unwrap_or_default()
    }

    pub fn last_outcome(&self) -> Option<BatchOutcome> {
        self.last_outcome
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn spinner(&self) -> usize {
        self.spinner
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }
}
