/// Eligibility Filter
///
/// Pure accept/reject decision over a parsed event. Check order is a design
/// contract: the preferred-title override short-circuits every check after
/// it, the conflict check included, and the conflict check runs last because
/// it re-scans the whole listing.

use crate::conflict::conflicts;
use crate::models::{Event, EventStatus};
use crate::page::PageAccessor;
use crate::settings::Config;

/// A non-empty preferred-title set decides alone once the status check
/// passed: hit accepts, miss rejects, nothing after it is consulted.
fn title_override(event: &Event, cfg: &Config) -> bool {
    !cfg.preferred_titles.is_empty() && cfg.preferred_titles.iter().any(|t| t == &event.title)
}

/// Rules 1-5: status, preferred-title override, category, campus, toggles.
/// Conflict detection is layered on top by `is_eligible` unless the title
/// override already decided.
pub fn satisfies_rules(event: &Event, cfg: &Config) -> bool {
    if event.status != EventStatus::Claimable {
        return false;
    }

    if !cfg.preferred_titles.is_empty() {
        return title_override(event, cfg);
    }

    if !cfg.required_categories.contains(&event.category) {
        return false;
    }

    let online = event.is_online();
    if !cfg.preferred_campuses.contains(&event.campus) && !online {
        return false;
    }

    if (online && !cfg.online_enabled) || (!online && !cfg.offline_enabled) {
        return false;
    }

    true
}

/// Full eligibility: the configured rules plus the schedule-conflict check
/// against currently held events (most expensive, evaluated last, and
/// skipped entirely when a preferred title decided the event).
pub fn is_eligible<P: PageAccessor>(page: &P, event: &Event, cfg: &Config) -> bool {
    if !satisfies_rules(event, cfg) {
        return false;
    }
    // A title hit already decided; not even a schedule conflict vetoes it.
    if title_override(event, cfg) {
        return true;
    }
    if conflicts(page, event.start_time, event.end_time) {
        println!("schedule conflict, skipping: {}", event.title);
        return false;
    }
    true
}

// ============================================================================
// Tests
// ============================================================================
