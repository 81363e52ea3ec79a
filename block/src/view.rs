//! Containing view state - block visibility, toolbar enablement and the
//! status line shown above the document.
//!
//! Pure functions over [`DocumentView`] snapshots; the view never mutates
//! session state directly, it sends commands to the session actor.

use chrono::{DateTime, Datelike, Utc};
use shared_types::{BlockStatus, BoundingBox, DisplayMode, DocumentView, SaveStatus, UiBlock};

/// Block panel flags owned by the chat view
#[derive(Debug, Clone, PartialEq)]
pub struct BlockView {
    block: UiBlock,
    toolbar_visible: bool,
}

impl BlockView {
    pub fn new(block: UiBlock) -> Self {
        Self {
            block,
            toolbar_visible: false,
        }
    }

    pub fn block(&self) -> &UiBlock {
        &self.block
    }

    /// Show a document in the block, animating from `origin` when given.
    pub fn open(
        &mut self,
        document_id: impl Into<String>,
        title: impl Into<String>,
        origin: Option<BoundingBox>,
    ) {
        self.block.document_id = document_id.into();
        self.block.title = title.into();
        self.block.is_visible = true;
        if let Some(origin) = origin {
            self.block.bounding_box = origin;
        }
    }

    pub fn show(&mut self) {
        self.block.is_visible = true;
    }

    pub fn hide(&mut self) {
        self.block.is_visible = false;
        self.toolbar_visible = false;
    }

    pub fn toggle_visibility(&mut self) {
        self.block.is_visible = !self.block.is_visible;
    }

    pub fn set_status(&mut self, status: BlockStatus) {
        self.block.status = status;
    }

    pub fn toolbar_visible(&self) -> bool {
        self.toolbar_visible
    }

    pub fn set_toolbar_visible(&mut self, visible: bool) {
        self.toolbar_visible = visible;
    }

    /// Mirror the session's latest content into the block.
    ///
    /// Only the current version is mirrored; browsing history leaves the
    /// block content alone. Returns `true` when the block changed.
    pub fn sync_content(&mut self, view: &DocumentView) -> bool {
        if !view.is_current_version || self.block.content == view.content {
            return false;
        }
        self.block.content = view.content.clone();
        true
    }
}

/// Which toolbar actions are available for the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toolbar {
    pub can_copy: bool,
    pub can_prev: bool,
    pub can_next: bool,
    pub can_toggle_diff: bool,
    pub diff_active: bool,
    /// Dim the chat panel while an older version is shown
    pub history_overlay: bool,
}

impl Toolbar {
    pub fn derive(view: &DocumentView) -> Self {
        let streaming = view.block_status == BlockStatus::Streaming;
        let has_previous = matches!(view.cursor, Some(cursor) if cursor > 0);
        Self {
            can_copy: !streaming,
            can_prev: has_previous && !streaming,
            can_next: !view.is_current_version && !streaming,
            // No earlier snapshot to diff against at the first version
            can_toggle_diff: has_previous && !streaming,
            diff_active: view.mode == DisplayMode::Diff,
            history_overlay: !view.is_current_version,
        }
    }
}

/// Text placed on the clipboard by the copy button.
pub fn clipboard_text(view: &DocumentView) -> &str {
    &view.content
}

/// Status line under the document title.
pub fn status_label(view: &DocumentView, now: DateTime<Utc>) -> String {
    match &view.save_status {
        SaveStatus::Dirty | SaveStatus::Saving => "Saving changes...".to_string(),
        SaveStatus::Error(message) => format!("Changes not saved: {message}"),
        SaveStatus::Clean => view
            .updated_at
            .map(|updated_at| format!("Updated {}", format_distance(updated_at, now)))
            .unwrap_or_default(),
    }
}

const MINUTES_IN_DAY: i64 = 1440;
const MINUTES_IN_ALMOST_TWO_DAYS: i64 = 2520;
const MINUTES_IN_MONTH: i64 = 43200;
const MINUTES_IN_TWO_MONTHS: i64 = 86400;

/// Relative time between two instants in words, with an "ago"/"in" suffix.
///
/// "less than a minute ago", "about 3 hours ago", "over 1 year ago", ...
pub fn format_distance(date: DateTime<Utc>, base: DateTime<Utc>) -> String {
    let (earlier, later) = if date <= base { (date, base) } else { (base, date) };
    let seconds = (later - earlier).num_seconds();
    let minutes = (seconds as f64 / 60.0).round() as i64;

    let distance = if minutes < 2 {
        if minutes < 1 {
            "less than a minute".to_string()
        } else {
            "1 minute".to_string()
        }
    } else if minutes < 45 {
        format!("{minutes} minutes")
    } else if minutes < 90 {
        "about 1 hour".to_string()
    } else if minutes < MINUTES_IN_DAY {
        let hours = (minutes as f64 / 60.0).round() as i64;
        format!("about {hours} hours")
    } else if minutes < MINUTES_IN_ALMOST_TWO_DAYS {
        "1 day".to_string()
    } else if minutes < MINUTES_IN_MONTH {
        let days = (minutes as f64 / MINUTES_IN_DAY as f64).round() as i64;
        format!("{days} days")
    } else if minutes < MINUTES_IN_TWO_MONTHS {
        let months = (minutes as f64 / MINUTES_IN_MONTH as f64).round() as i64;
        plural(months, "about 1 month", "about {} months")
    } else {
        let months = calendar_months_between(earlier, later);
        if months < 12 {
            let nearest = (minutes as f64 / MINUTES_IN_MONTH as f64).round() as i64;
            plural(nearest, "1 month", "{} months")
        } else {
            let years = months / 12;
            match months % 12 {
                0..=2 => plural(years, "about 1 year", "about {} years"),
                3..=8 => plural(years, "over 1 year", "over {} years"),
                _ => plural(years + 1, "almost 1 year", "almost {} years"),
            }
        }
    };

    if date <= base {
        format!("{distance} ago")
    } else {
        format!("in {distance}")
    }
}

fn plural(count: i64, one: &str, many: &str) -> String {
    if count == 1 {
        one.to_string()
    } else {
        many.replace("{}", &count.to_string())
    }
}

/// Whole calendar months from `earlier` to `later`.
fn calendar_months_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    let mut months = (later.year() as i64 - earlier.year() as i64) * 12
        + (later.month() as i64 - earlier.month() as i64);
    if months > 0 && (later.day(), later.time()) < (earlier.day(), earlier.time()) {
        months -= 1;
    }
    months
}
