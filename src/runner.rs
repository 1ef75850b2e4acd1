/// Poll Loop Controller
///
/// Repeats scan -> filter -> rank -> claim until a claim sticks, the
/// operator asks for a stop, or the session dies beyond recovery. The stop
/// flag is only consulted between iterations, so an interrupt never lands
/// mid-transaction.

use crate::claim::ClaimExecutor;
use crate::errors::StepError;
use crate::models::{ClaimOutcome, RunOutcome};
use crate::page::PageAccessor;
use crate::scanner::scan;
use crate::session::SessionProvider;
use crate::settings::Config;
use crate::solver::ChallengeSolver;
use anyhow::Result;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// How many top-ranked candidates to show per productive scan.
const CANDIDATE_DISPLAY_LIMIT: usize = 3;

pub fn run<P, S, L>(
    page: &P,
    solver: &S,
    session: &L,
    cfg: &Config,
    stop: &AtomicBool,
) -> Result<RunOutcome>
where
    P: PageAccessor,
    S: ChallengeSolver,
    L: SessionProvider,
{
    let mut scan_count: u64 = 0;
    // Cosmetic: report "nothing yet" once, then stay quiet until the
    // listing produces candidates again.
    let mut quiet_reported = false;

    loop {
        if stop.load(Ordering::Relaxed) {
            println!("stop requested, leaving the scan loop");
            return Ok(RunOutcome::Stopped);
        }
        scan_count += 1;

        match scan(page, cfg) {
            Ok(candidates) if candidates.is_empty() => {
                if !quiet_reported {
                    println!("scan {scan_count}: no claimable candidates yet, watching...");
                    quiet_reported = true;
                }
                thread::sleep(cfg.timeouts.scan_interval);
            }
            Ok(candidates) => {
                quiet_reported = false;
                println!("scan {scan_count}: {} eligible candidate(s)", candidates.len());
                for (i, event) in candidates.iter().take(CANDIDATE_DISPLAY_LIMIT).enumerate() {
                    println!("  {}. {} [{}]", i + 1, event.title, event.start_time);
                }

                let mut executor = ClaimExecutor::new(page, solver, cfg);
                match executor.execute(&candidates[0]) {
                    ClaimOutcome::Success => {
                        println!("reservation secured, run complete");
                        return Ok(RunOutcome::Claimed);
                    }
                    ClaimOutcome::Failed => {
                        println!("claim failed, resuming the scan");
                        thread::sleep(jittered(cfg.timeouts.retry_delay));
                    }
                }
            }
            Err(e) => {
                quiet_reported = false;
                eprintln!("scan cycle failed: {e}");
                if let Err(e) = recover(page, session, cfg) {
                    eprintln!("{e}, aborting the run");
                    return Ok(RunOutcome::Aborted);
                }
            }
        }
    }
}

/// Recovery ladder for errors that escape a cycle: refresh the listing, and
/// if the page itself is gone, re-login. Both rungs failing is the one
/// session failure the run cannot survive.
fn recover<P: PageAccessor, L: SessionProvider>(
    page: &P,
    session: &L,
    cfg: &Config,
) -> Result<(), StepError> {
    match page.refresh() {
        Ok(()) => {
            thread::sleep(cfg.timeouts.page_load);
            Ok(())
        }
        Err(e) => {
            eprintln!("refresh failed ({e}), attempting re-login");
            if session.login(page).unwrap_or(false) {
                Ok(())
            } else {
                Err(StepError::Session("refresh and re-login both failed".into()))
            }
        }
    }
}

/// Retry delay with up to 25% random jitter so repeated failures do not
/// hammer the portal on an exact cadence.
fn jittered(delay: Duration) -> Duration {
    let spread = delay.as_millis() as u64 / 4;
    let extra = rand::thread_rng().gen_range(0..=spread);
    delay + Duration::from_millis(extra)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AccessError;
    use crate::page::ElementRef;
    use crate::settings::Timeouts;

    /// Page whose browser session is gone: every operation fails.
    struct DeadPage;

    impl PageAccessor for DeadPage {
        fn find_all(&self, _selector: &str) -> Result<Vec<ElementRef>, AccessError> {
            Err(AccessError::Protocol("browser session gone".into()))
        }
        fn find_all_within(
            &self,
            _root: &ElementRef,
            _selector: &str,
        ) -> Result<Vec<ElementRef>, AccessError> {
            Err(AccessError::Protocol("browser session gone".into()))
        }
        fn find_one(&self, _root: &ElementRef, selector: &str) -> Result<ElementRef, AccessError> {
            Err(AccessError::NotFound(selector.to_string()))
        }
        fn find(&self, selector: &str) -> Result<ElementRef, AccessError> {
            Err(AccessError::NotFound(selector.to_string()))
        }
        fn text(&self, _el: &ElementRef) -> Result<String, AccessError> {
            Err(AccessError::Stale)
        }
        fn attribute(&self, _el: &ElementRef, _name: &str) -> Result<String, AccessError> {
            Err(AccessError::Stale)
        }
        fn click(&self, _el: &ElementRef) -> Result<(), AccessError> {
            Err(AccessError::Stale)
        }
        fn type_text(&self, _el: &ElementRef, _text: &str) -> Result<(), AccessError> {
            Err(AccessError::Stale)
        }
        fn clear(&self, _el: &ElementRef) -> Result<(), AccessError> {
            Err(AccessError::Stale)
        }
        fn goto(&self, _url: &str) -> Result<(), AccessError> {
            Err(AccessError::Protocol("browser session gone".into()))
        }
        fn refresh(&self) -> Result<(), AccessError> {
            Err(AccessError::Protocol("browser session gone".into()))
        }
        fn current_location(&self) -> Result<String, AccessError> {
            Err(AccessError::Protocol("browser session gone".into()))
        }
        fn source(&self) -> Result<String, AccessError> {
            Err(AccessError::Protocol("browser session gone".into()))
        }
        fn screenshot(&self) -> Result<Vec<u8>, AccessError> {
            Err(AccessError::Protocol("browser session gone".into()))
        }
    }

    /// Session provider that can never get back in.
    struct NoSession;

    impl SessionProvider for NoSession {
        fn login<P: PageAccessor>(&self, _page: &P) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    fn cfg() -> Config {
        Config {
            card_number: String::new(),
            password: String::new(),
            webdriver_url: String::new(),
            ocr_url: String::new(),
            headless: true,
            preferred_titles: vec![],
            required_categories: vec![],
            preferred_campuses: vec![],
            online_enabled: true,
            offline_enabled: true,
            max_claim_attempts: 3,
            timeouts: Timeouts {
                page_load: Duration::from_millis(1),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_exhausted_recovery_ladder_is_a_session_error() {
        let err = recover(&DeadPage, &NoSession, &cfg()).unwrap_err();
        assert!(matches!(err, StepError::Session(_)));
        assert!(err.to_string().contains("refresh and re-login"));
    }

    #[test]
    fn test_jitter_stays_within_a_quarter_of_the_delay() {
        let base = Duration::from_millis(100);
        for _ in 0..50 {
            let d = jittered(base);
            assert!(d >= base);
            assert!(d <= base + Duration::from_millis(25));
        }
    }

    #[test]
    fn test_jitter_handles_tiny_delays() {
        // spread rounds down to zero; must not panic on an empty range
        assert_eq!(jittered(Duration::from_millis(2)), Duration::from_millis(2));
    }
}
