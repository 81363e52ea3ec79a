//! Version navigator - pure logic, no actors, no timers
//!
//! Tracks which snapshot of the history is on screen and whether the panel
//! shows the editor or the diff against the previous snapshot.

use shared_types::{DiffPair, DisplayMode, DocumentSnapshot, VersionCommand};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionNavigator {
    cursor: Option<usize>,
    mode: DisplayMode,
}

impl VersionNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Apply a toolbar command against a history of `len` snapshots.
    ///
    /// Returns `true` when the cursor or the mode changed.
    pub fn apply(&mut self, command: VersionCommand, len: usize) -> bool {
        let before = self.clone();
        match command {
            VersionCommand::Latest => {
                if let Some(last) = len.checked_sub(1) {
                    self.cursor = Some(last);
                }
                self.mode = DisplayMode::Edit;
            }
            VersionCommand::Toggle => {
                self.mode = self.mode.toggled();
            }
            VersionCommand::Prev => {
                if let Some(cursor) = self.cursor {
                    if cursor > 0 && len > 0 {
                        self.cursor = Some((cursor - 1).min(len - 1));
                    }
                }
            }
            VersionCommand::Next => {
                if let Some(cursor) = self.cursor {
                    if cursor + 1 < len {
                        self.cursor = Some(cursor + 1);
                    }
                }
            }
        }
        *self != before
    }

    /// An empty (or not yet loaded) history always counts as current.
    pub fn is_current_version(&self, len: usize) -> bool {
        match len.checked_sub(1) {
            None => true,
            Some(last) => self.cursor == Some(last),
        }
    }

    /// Re-anchor the cursor after the history changed from `previous_len`
    /// to `new_len` snapshots.
    ///
    /// A reader parked on an older snapshot keeps their place; only an unset
    /// cursor or one sitting on the previous latest follows the new latest.
    pub fn sync(&mut self, previous_len: usize, new_len: usize) {
        let Some(new_last) = new_len.checked_sub(1) else {
            self.cursor = None;
            return;
        };
        let follow_latest = match self.cursor {
            None => true,
            Some(cursor) => previous_len.checked_sub(1) == Some(cursor),
        };
        self.cursor = if follow_latest {
            Some(new_last)
        } else {
            self.cursor.map(|cursor| cursor.min(new_last))
        };
    }

    /// Old/new pair for the diff view, `None` when there is no earlier
    /// snapshot to compare against.
    pub fn diff_pair(&self, history: Option<&[DocumentSnapshot]>) -> Option<DiffPair> {
        let cursor = self.cursor.filter(|cursor| *cursor > 0)?;
        let len = history.map(<[DocumentSnapshot]>::len).unwrap_or(0);
        if cursor >= len {
            return None;
        }
        Some(DiffPair {
            previous: content_at(history, cursor - 1).to_string(),
            current: content_at(history, cursor).to_string(),
        })
    }
}

/// Content of the snapshot at `index`, empty when the history is absent or
/// the index is out of range.
pub fn content_at(history: Option<&[DocumentSnapshot]>, index: usize) -> &str {
    history
        .and_then(|snapshots| snapshots.get(index))
        .map(|snapshot| snapshot.content.as_str())
        .unwrap_or("")
}
