/// Event Parser
///
/// Turns one raw listing entry into a structured `Event`. Structural lookup
/// failures are never fatal to a scan: the entry is logged and skipped.

use crate::errors::{AccessError, StepError};
use crate::models::{Event, EventStatus};
use crate::page::{ElementRef, PageAccessor};
use crate::settings::{
    ACTION_BUTTON_SELECTOR, CAMPUS_MARKER, CATEGORY_SELECTOR, DETAIL_TEXT_SELECTOR,
    TIMESTAMP_FORMAT, TITLE_SELECTOR, VENUE_SELECTOR,
};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

/// Schedule timestamps as rendered: "YYYY/MM/DD/HH:MM:SS".
static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}/\d{2}/\d{2}/\d{2}:\d{2}:\d{2}").expect("timestamp pattern"));

/// Parse one listing entry. `None` on any structural failure; the record is
/// either fully populated or absent, never half-built.
pub fn parse_event<P: PageAccessor>(page: &P, handle: &ElementRef) -> Option<Event> {
    match try_parse(page, handle) {
        Ok(event) => Some(event),
        Err(e) => {
            eprintln!("entry skipped: {e}");
            None
        }
    }
}

fn try_parse<P: PageAccessor>(page: &P, handle: &ElementRef) -> Result<Event, StepError> {
    let category = field_text(page, handle, CATEGORY_SELECTOR)?;
    let title = field_text(page, handle, TITLE_SELECTOR)?;
    let venue_raw = field_text(page, handle, VENUE_SELECTOR)?;

    // The schedule line is the second detail text within the entry.
    let details = page.find_all_within(handle, DETAIL_TEXT_SELECTOR)?;
    let schedule_el = details
        .get(1)
        .ok_or_else(|| StepError::Parse(format!("entry has {} detail field(s), need 2", details.len())))?;
    let schedule_text = page.text(schedule_el)?;
    let (start_time, end_time) = parse_schedule(&schedule_text)?;

    let button = page.find_one(handle, ACTION_BUTTON_SELECTOR)?;
    let label = page.text(&button)?;

    Ok(Event {
        campus: extract_campus(&venue_raw),
        category,
        title,
        venue_raw,
        start_time,
        end_time,
        status: EventStatus::from_label(&label),
        handle: handle.clone(),
    })
}

fn field_text<P: PageAccessor>(
    page: &P,
    root: &ElementRef,
    selector: &str,
) -> Result<String, AccessError> {
    let el = page.find_one(root, selector)?;
    page.text(&el)
}

/// First two timestamp matches in the schedule text are start and end.
fn parse_schedule(text: &str) -> Result<(NaiveDateTime, NaiveDateTime), StepError> {
    let mut matches = TIMESTAMP_RE.find_iter(text);
    let start = matches
        .next()
        .ok_or_else(|| StepError::Parse(format!("no timestamps in schedule text `{text}`")))?;
    let end = matches
        .next()
        .ok_or_else(|| StepError::Parse(format!("only one timestamp in schedule text `{text}`")))?;

    let parse = |m: regex::Match<'_>| {
        NaiveDateTime::parse_from_str(m.as_str(), TIMESTAMP_FORMAT)
            .map_err(|e| StepError::Parse(format!("bad timestamp `{}`: {e}", m.as_str())))
    };
    Ok((parse(start)?, parse(end)?))
}

/// Campus is the venue prefix up to and including the campus marker; venues
/// without a marker (meeting links, off-site halls) pass through unchanged.
pub fn extract_campus(venue: &str) -> String {
    venue
        .find(CAMPUS_MARKER)
        .map(|idx| venue[..idx + CAMPUS_MARKER.len()].to_string())
        .unwrap_or_else(|| venue.to_string())
}

// ============================================================================
// Tests
// ============================================================================
