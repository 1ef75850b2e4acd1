/// Priority Ranker
///
/// Deterministic ordering over eligible events. Stable ascending sort so
/// that exact key ties keep their listing order.

use crate::models::Event;
use crate::settings::Config;
use chrono::NaiveDateTime;

/// Sort key: required-category first, then preferred-campus-or-online, then
/// earliest start time.
pub fn priority_key(event: &Event, cfg: &Config) -> (u8, u8, NaiveDateTime) {
    let required_flag = if cfg.required_categories.contains(&event.category) { 0 } else { 1 };
    let campus_flag = if event.is_online() || cfg.preferred_campuses.contains(&event.campus) {
        0
    } else {
        1
    };
    (required_flag, campus_flag, event.start_time)
}

/// Order eligible events best-first. `sort_by_key` is stable, so equal-key
/// events retain listing order.
pub fn rank(events: &mut [Event], cfg: &Config) {
    events.sort_by_key(|ev| priority_key(ev, cfg));
}

// ============================================================================
// Tests
// ============================================================================
