// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Terminal driver.
//!
//! One task owns the [`App`] and is the only writer of its state. Terminal
//! input and the results of background work arrive on a single
//! `tokio::select!`; each event goes through [`App::update`], the returned
//! commands are started, and the screen is redrawn. Background work never
//! touches the app directly, it reports back over an unbounded channel.

pub mod render;
pub mod theme;

pub use theme::Theme;

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, Show},
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::app::{App, AppEvent, Command, TransferBatch};
use crate::rclone::RcloneClient;
use crate::transfer::Orchestrator;

/// How long to wait for a cancelled batch to kill its subprocess on exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Raw mode + alternate screen for the guard's lifetime.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        let _ = disable_raw_mode();
    }
}

/// Starts the work that [`Command`]s ask for.
pub struct Dispatcher {
    client: Arc<RcloneClient>,
    events: UnboundedSender<AppEvent>,
    tick_interval: Duration,
    batch: Option<JoinHandle<()>>,
}

impl Dispatcher {
    pub fn new(
        client: Arc<RcloneClient>,
        tick_interval: Duration,
    ) -> (Self, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            client,
            events: tx,
            tick_interval,
            batch: None,
        };
        (dispatcher, rx)
    }

    /// Run `commands`. Returns `true` when one of them asks to quit.
    pub fn dispatch(&mut self, commands: Vec<Command>) -> bool {
        let mut quit = false;
        for command in commands {
            match command {
                Command::LoadRemotes => self.load_remotes(),
                Command::LoadFiles { remote, path } => self.load_files(remote, path),
                Command::RunTransfers(batch) => self.run_transfers(batch),
                Command::ScheduleTick => self.schedule_tick(),
                Command::Quit => quit = true,
            }
        }
        quit
    }

    fn load_remotes(&self) {
        let client = Arc::clone(&self.client);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = client.list_remotes().await.map_err(|e| format!("{:#}", e));
            let _ = tx.send(AppEvent::RemotesLoaded(result));
        });
    }

    fn load_files(&self, remote: String, path: String) {
        let client = Arc::clone(&self.client);
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = client
                .list_files(&remote, &path)
                .await
                .map_err(|e| format!("{:#}", e));
            let _ = tx.send(AppEvent::FilesLoaded {
                remote,
                path,
                result,
            });
        });
    }

    fn run_transfers(&mut self, batch: TransferBatch) {
        let TransferBatch {
            items,
            manager,
            queue,
            cancel,
            destination,
        } = batch;
        let orchestrator = Orchestrator::new(Arc::clone(&self.client), manager, queue, destination);
        let tx = self.events.clone();
        self.batch = Some(tokio::spawn(async move {
            let outcome = orchestrator.run(items, cancel).await;
            let _ = tx.send(AppEvent::BatchFinished(outcome));
        }));
    }

    fn schedule_tick(&self) {
        let tx = self.events.clone();
        let interval = self.tick_interval;
        tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            let _ = tx.send(AppEvent::Tick);
        });
    }

    /// Wait for a running batch to observe its cancellation.
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.batch.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
                tracing::warn!("transfer batch did not stop within the shutdown grace period");
            }
        }
    }
}

fn redraw<W: Write>(out: &mut W, app: &App) -> Result<()> {
    let (width, height) = app.size();
    render::draw(out, &render::render(app), width, height).context("Failed to draw screen")
}

/// Run the interactive session until the user quits.
pub async fn run(mut app: App, client: Arc<RcloneClient>) -> Result<()> {
    let (mut dispatcher, mut rx) = Dispatcher::new(client, app.settings().tick_interval);
    let guard = TerminalGuard::enter().context("Failed to initialize terminal")?;
    let mut stdout = io::stdout();
    let mut input = EventStream::new();

    if let Ok((width, height)) = terminal::size() {
        app.update(AppEvent::Resize(width, height));
    }
    let commands = app.init();
    let mut quit = dispatcher.dispatch(commands);
    redraw(&mut stdout, &app)?;

    while !quit {
        let event = tokio::select! {
            next = input.next() => match next {
                Some(Ok(Event::Key(key))) if key.kind != KeyEventKind::Release => AppEvent::Key(key),
                Some(Ok(Event::Resize(width, height))) => AppEvent::Resize(width, height),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e).context("Failed to read terminal input"),
                None => break,
            },
            Some(event) = rx.recv() => event,
        };

        let commands = app.update(event);
        quit = dispatcher.dispatch(commands);
        if !quit {
            redraw(&mut stdout, &app)?;
        }
    }

    drop(guard);
    dispatcher.shutdown().await;
    tracing::info!("session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_client() -> Arc<RcloneClient> {
        Arc::new(RcloneClient::new("/nonexistent/rfetch-test-rclone", "500ms"))
    }

    #[tokio::test]
    async fn test_load_remotes_reports_error() {
        let (mut dispatcher, mut rx) = Dispatcher::new(missing_client(), Duration::from_millis(10));
        assert!(!dispatcher.dispatch(vec![Command::LoadRemotes]));

        match rx.recv().await {
            Some(AppEvent::RemotesLoaded(Err(e))) => assert!(e.contains("Failed to list remotes")),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_files_echoes_location() {
        let (mut dispatcher, mut rx) = Dispatcher::new(missing_client(), Duration::from_millis(10));
        dispatcher.dispatch(vec![Command::LoadFiles {
            remote: "gdrive".into(),
            path: "docs".into(),
        }]);

        match rx.recv().await {
            Some(AppEvent::FilesLoaded { remote, path, result }) => {
                assert_eq!(remote, "gdrive");
                assert_eq!(path, "docs");
                assert!(result.is_err());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tick_and_quit() {
        let (mut dispatcher, mut rx) = Dispatcher::new(missing_client(), Duration::from_millis(5));
        assert!(dispatcher.dispatch(vec![Command::ScheduleTick, Command::Quit]));
        assert!(matches!(rx.recv().await, Some(AppEvent::Tick)));
    }

    #[tokio::test]
    async fn test_shutdown_without_batch_returns() {
        let (mut dispatcher, _rx) = Dispatcher::new(missing_client(), Duration::from_millis(5));
        tokio::time::timeout(Duration::from_secs(1), dispatcher.shutdown())
            .await
            .expect("shutdown with no batch should return at once");
    }
}
