/// Page access capability boundary
///
/// Everything the pipeline does to the rendered page goes through
/// `PageAccessor`. The production implementation speaks the WebDriver wire
/// protocol (`driver` module); tests drive the same trait with an in-memory
/// fake. Every operation may fail with a generic access condition which the
/// core always treats as recoverable.

use crate::errors::AccessError;
use std::thread;
use std::time::{Duration, Instant};

/// Opaque handle to one rendered element. Valid until the next navigation or
/// refresh; using it after that surfaces as `AccessError::Stale`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(pub String);

pub trait PageAccessor {
    /// All elements matching a CSS selector, document-wide.
    fn find_all(&self, selector: &str) -> Result<Vec<ElementRef>, AccessError>;

    /// All elements matching a CSS selector below the given element.
    fn find_all_within(
        &self,
        root: &ElementRef,
        selector: &str,
    ) -> Result<Vec<ElementRef>, AccessError>;

    /// First element matching a CSS selector below the given element.
    fn find_one(&self, root: &ElementRef, selector: &str) -> Result<ElementRef, AccessError>;

    /// First element matching a CSS selector, document-wide.
    fn find(&self, selector: &str) -> Result<ElementRef, AccessError>;

    fn text(&self, el: &ElementRef) -> Result<String, AccessError>;

    /// Attribute value, empty string when the attribute is absent.
    fn attribute(&self, el: &ElementRef, name: &str) -> Result<String, AccessError>;

    fn click(&self, el: &ElementRef) -> Result<(), AccessError>;

    fn type_text(&self, el: &ElementRef, text: &str) -> Result<(), AccessError>;

    fn clear(&self, el: &ElementRef) -> Result<(), AccessError>;

    fn goto(&self, url: &str) -> Result<(), AccessError>;

    fn refresh(&self) -> Result<(), AccessError>;

    fn current_location(&self) -> Result<String, AccessError>;

    /// Full rendered page source.
    fn source(&self) -> Result<String, AccessError>;

    /// PNG screenshot of the current viewport.
    fn screenshot(&self) -> Result<Vec<u8>, AccessError>;

    fn page_contains(&self, needle: &str) -> Result<bool, AccessError> {
        Ok(self.source()?.contains(needle))
    }
}

/// Granularity of the bounded-wait polling loops.
const POLL_STEP: Duration = Duration::from_millis(25);

/// Poll for matching elements until at least one renders or the bound is
/// exceeded. Timeout degrades to an empty list, never an error; access
/// errors during polling are retried until the deadline.
pub fn wait_for_any<P: PageAccessor>(
    page: &P,
    selector: &str,
    timeout: Duration,
) -> Vec<ElementRef> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(found) = page.find_all(selector) {
            if !found.is_empty() {
                return found;
            }
        }
        if Instant::now() >= deadline {
            return Vec::new();
        }
        thread::sleep(POLL_STEP.min(timeout));
    }
}

/// Poll for a single element; `None` when the bound is exceeded.
pub fn wait_for<P: PageAccessor>(
    page: &P,
    selector: &str,
    timeout: Duration,
) -> Option<ElementRef> {
    wait_for_any(page, selector, timeout).into_iter().next()
}

// ============================================================================
// Probe chains
// ============================================================================

/// One candidate selector in an ordered fallback chain.
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub label: &'static str,
    pub selector: &'static str,
}

/// Try each probe in order, waiting up to `per_probe` for it to render.
/// Returns the first match together with the probe that hit, or `None` when
/// the whole chain misses.
pub fn first_match<P: PageAccessor>(
    page: &P,
    probes: &[Probe],
    per_probe: Duration,
) -> Option<(ElementRef, Probe)> {
    for probe in probes {
        if let Some(el) = wait_for(page, probe.selector, per_probe) {
            return Some((el, *probe));
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================
