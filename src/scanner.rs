/// Scan cycle
///
/// One pass over the listing: refresh, wait (bounded) for entries to render,
/// parse each, keep the eligible ones, rank them best-first. A wait timeout
/// means "no candidates this cycle", not an error; a failed refresh escapes
/// to the poll loop's recovery ladder.

use crate::errors::StepError;
use crate::filter::is_eligible;
use crate::models::Event;
use crate::page::{wait_for_any, PageAccessor};
use crate::parser::parse_event;
use crate::rank::rank;
use crate::settings::{Config, ENTRY_SELECTOR};

pub fn scan<P: PageAccessor>(page: &P, cfg: &Config) -> Result<Vec<Event>, StepError> {
    page.refresh()?;

    let entries = wait_for_any(page, ENTRY_SELECTOR, cfg.timeouts.element_wait);

    let mut eligible = Vec::new();
    for handle in &entries {
        let Some(event) = parse_event(page, handle) else {
            continue;
        };
        if is_eligible(page, &event, cfg) {
            eligible.push(event);
        }
    }

    rank(&mut eligible, cfg);
    Ok(eligible)
}
