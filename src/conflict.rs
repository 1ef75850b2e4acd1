/// Conflict Detector
///
/// Decides whether a candidate time range overlaps any event the user
/// already holds. Held events are re-derived from the live listing on every
/// call; nothing is cached or persisted. A failed scan fails open: the
/// candidate is assumed conflict-free.

use crate::errors::StepError;
use crate::models::EventStatus;
use crate::page::PageAccessor;
use crate::parser::parse_event;
use crate::settings::ENTRY_SELECTOR;
use chrono::NaiveDateTime;

/// Closed-interval overlap. Boundary touching counts: a candidate ending
/// exactly when a held event starts (or vice versa) is a conflict.
pub fn overlaps(
    cand_start: NaiveDateTime,
    cand_end: NaiveDateTime,
    held_start: NaiveDateTime,
    held_end: NaiveDateTime,
) -> bool {
    cand_start <= held_end && cand_end >= held_start
}

/// True when the candidate range collides with any already-held entry.
pub fn conflicts<P: PageAccessor>(
    page: &P,
    cand_start: NaiveDateTime,
    cand_end: NaiveDateTime,
) -> bool {
    match scan_held(page, cand_start, cand_end) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("conflict scan failed, assuming no conflict: {e}");
            false
        }
    }
}

fn scan_held<P: PageAccessor>(
    page: &P,
    cand_start: NaiveDateTime,
    cand_end: NaiveDateTime,
) -> Result<bool, StepError> {
    let entries = page
        .find_all(ENTRY_SELECTOR)
        .map_err(|e| StepError::ConflictScan(e.to_string()))?;

    for handle in &entries {
        // Unparseable entries are skipped here the same way the scan skips them.
        let Some(event) = parse_event(page, handle) else {
            continue;
        };
        if event.status != EventStatus::AlreadyHeld {
            continue;
        }
        if overlaps(cand_start, cand_end, event.start_time, event.end_time) {
            return Ok(true);
        }
    }
    Ok(false)
}

// ============================================================================
// Tests
// ============================================================================
