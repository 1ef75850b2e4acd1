// Core types for the reservation pipeline

use crate::page::ElementRef;
use crate::settings::{CLAIMABLE_LABEL, HELD_LABEL, ONLINE_MARKER};
use chrono::NaiveDateTime;
use std::fmt;

/// What the action control on a listing entry offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// Can still be reserved.
    Claimable,
    /// Already reserved by this user; the control offers cancellation.
    AlreadyHeld,
    /// Anything else (full, closed, pending).
    Other,
}

impl EventStatus {
    /// Derive the status from the trimmed action-button label.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            l if l == CLAIMABLE_LABEL => EventStatus::Claimable,
            l if l == HELD_LABEL => EventStatus::AlreadyHeld,
            _ => EventStatus::Other,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Claimable => f.write_str("claimable"),
            EventStatus::AlreadyHeld => f.write_str("already-held"),
            EventStatus::Other => f.write_str("other"),
        }
    }
}

/// One scheduled, capacity-limited activity parsed out of the listing.
/// Ephemeral: rebuilt on every scan, owned by the current cycle only.
#[derive(Debug, Clone)]
pub struct Event {
    pub category: String,
    pub title: String,
    /// Venue text exactly as rendered.
    pub venue_raw: String,
    /// Prefix of `venue_raw` up to and including the campus marker, or the
    /// raw string when no marker is present.
    pub campus: String,
    /// `start_time <= end_time` is assumed, never validated; malformed pairs
    /// propagate as-is.
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: EventStatus,
    /// Back-reference to the originating page element. Not owned; only used
    /// to drive the claim transaction within the same cycle.
    pub handle: ElementRef,
}

impl Event {
    /// "Online" is structural: the title carries the online marker token.
    pub fn is_online(&self) -> bool {
        self.title.contains(ONLINE_MARKER)
    }
}

/// Terminal result of one claim transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Success,
    Failed,
}

/// Terminal state of a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// An event was claimed and verified.
    Claimed,
    /// The operator requested a stop between cycles.
    Stopped,
    /// The session became unrecoverable.
    Aborted,
}

// ============================================================================
// Tests
// ============================================================================
