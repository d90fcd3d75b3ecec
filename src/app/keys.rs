// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Key bindings.
//!
//! A key may be bound to several actions (backspace is both "left" and
//! "back"); each screen checks the actions it cares about in its own order.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Logical input actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Back,
    Select,
    SelectAll,
    Queue,
    Filter,
    Escape,
    Quit,
    Help,
    Start,
    Remove,
    Refresh,
}

/// One physical key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyPress {
    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub const fn ch(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
        }
    }

    /// Shift is ignored so that `?` matches whether or not the terminal
    /// reports the shift used to type it.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        let mut mods = event.modifiers;
        mods.remove(KeyModifiers::SHIFT);
        self.code == event.code && self.modifiers == mods
    }
}

/// A set of keys for one action plus its help text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub keys: Vec<KeyPress>,
    pub help_key: &'static str,
    pub help: &'static str,
}

impl Binding {
    fn new(keys: Vec<KeyPress>, help_key: &'static str, help: &'static str) -> Self {
        Self {
            keys,
            help_key,
            help,
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.keys.iter().any(|k| k.matches(event))
    }
}

/// The full key map. Built once and handed to the app through `Settings`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    pub up: Binding,
    pub down: Binding,
    pub left: Binding,
    pub right: Binding,
    pub enter: Binding,
    pub back: Binding,
    pub select: Binding,
    pub select_all: Binding,
    pub queue: Binding,
    pub filter: Binding,
    pub escape: Binding,
    pub quit: Binding,
    pub help: Binding,
    pub start: Binding,
    pub remove: Binding,
    pub refresh: Binding,
}

impl Default for KeyMap {
    fn default() -> Self {
        use KeyCode::*;
        Self {
            up: Binding::new(vec![KeyPress::ch('k'), KeyPress::plain(Up)], "k/↑", "up"),
            down: Binding::new(vec![KeyPress::ch('j'), KeyPress::plain(Down)], "j/↓", "down"),
            left: Binding::new(
                vec![KeyPress::ch('h'), KeyPress::plain(Left), KeyPress::plain(Backspace)],
                "h/←",
                "back",
            ),
            right: Binding::new(vec![KeyPress::ch('l'), KeyPress::plain(Right)], "l/→", "open"),
            enter: Binding::new(vec![KeyPress::plain(Enter)], "enter", "select/open"),
            back: Binding::new(
                vec![KeyPress::plain(Backspace), KeyPress::ch('h'), KeyPress::plain(Left)],
                "h/←/backspace",
                "go back",
            ),
            select: Binding::new(vec![KeyPress::ch(' ')], "space", "toggle select"),
            select_all: Binding::new(vec![KeyPress::ch('a')], "a", "select all"),
            queue: Binding::new(vec![KeyPress::ch('q')], "q", "view queue"),
            filter: Binding::new(vec![KeyPress::ch('/')], "/", "filter"),
            escape: Binding::new(vec![KeyPress::plain(Esc)], "esc", "cancel/back"),
            quit: Binding::new(vec![KeyPress::ctrl('c')], "ctrl+c", "quit"),
            help: Binding::new(vec![KeyPress::ch('?')], "?", "help"),
            start: Binding::new(vec![KeyPress::ch('s')], "s", "start download"),
            remove: Binding::new(vec![KeyPress::ch('d'), KeyPress::ch('x')], "d/x", "remove from queue"),
            refresh: Binding::new(vec![KeyPress::ch('r')], "r", "refresh"),
        }
    }
}

impl KeyMap {
    pub fn binding(&self, action: Action) -> &Binding {
        match action {
            Action::Up => &self.up,
            Action::Down => &self.down,
            Action::Left => &self.left,
            Action::Right => &self.right,
            Action::Enter => &self.enter,
            Action::Back => &self.back,
            Action::Select => &self.select,
            Action::SelectAll => &self.select_all,
            Action::Queue => &self.queue,
            Action::Filter => &self.filter,
            Action::Escape => &self.escape,
            Action::Quit => &self.quit,
            Action::Help => &self.help,
            Action::Start => &self.start,
            Action::Remove => &self.remove,
            Action::Refresh => &self.refresh,
        }
    }

    pub fn matches(&self, action: Action, event: &KeyEvent) -> bool {
        self.binding(action).matches(event)
    }

    /// True if `event` matches any of `actions`.
    pub fn matches_any(&self, actions: &[Action], event: &KeyEvent) -> bool {
        actions.iter().any(|a| self.matches(*a, event))
    }

    /// Rows for the help overlay.
    pub fn help_rows(&self) -> Vec<(&'static str, &'static str)> {
        [
            Action::Up,
            Action::Down,
            Action::Left,
            Action::Right,
            Action::Enter,
            Action::Select,
            Action::SelectAll,
            Action::Queue,
            Action::Filter,
            Action::Escape,
            Action::Refresh,
            Action::Start,
            Action::Remove,
            Action::Help,
            Action::Quit,
        ]
        .iter()
        .map(|a| {
            let b = self.binding(*a);
            (b.help_key, b.help)
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_vim_and_arrow_keys() {
        let keys = KeyMap::default();
        assert!(keys.matches(Action::Up, &key(KeyCode::Char('k'))));
        assert!(keys.matches(Action::Up, &key(KeyCode::Up)));
        assert!(keys.matches(Action::Down, &key(KeyCode::Char('j'))));
        assert!(!keys.matches(Action::Down, &key(KeyCode::Char('k'))));
    }

    #[test]
    fn test_backspace_is_left_and_back() {
        let keys = KeyMap::default();
        let bs = key(KeyCode::Backspace);
        assert!(keys.matches(Action::Left, &bs));
        assert!(keys.matches(Action::Back, &bs));
        assert!(keys.matches_any(&[Action::Escape, Action::Back], &bs));
    }

    #[test]
    fn test_quit_requires_control() {
        let keys = KeyMap::default();
        assert!(!keys.matches(Action::Quit, &key(KeyCode::Char('c'))));
        assert!(keys.matches(
            Action::Quit,
            &KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
        ));
        assert!(!keys.matches(
            Action::Refresh,
            &KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL)
        ));
    }

    #[test]
    fn test_shift_is_ignored() {
        let keys = KeyMap::default();
        let event = KeyEvent::new(KeyCode::Char('?'), KeyModifiers::SHIFT);
        assert!(keys.matches(Action::Help, &event));
    }

    #[test]
    fn test_help_rows_cover_quit() {
        let rows = KeyMap::default().help_rows();
        assert!(rows.contains(&("ctrl+c", "quit")));
        assert!(rows.contains(&("d/x", "remove from queue")));
    }
}
