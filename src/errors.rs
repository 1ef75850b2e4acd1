/// Error taxonomy for the scan-filter-rank-claim pipeline
///
/// Page access failures and step failures are separate layers: an
/// `AccessError` says a single page operation went wrong, a `StepError` says
/// what that means for the pipeline. Callers match on the kind to decide
/// skip, retry, or escalate; only `Session` is ever fatal.

use thiserror::Error;

/// A single page or element operation failed. Always treated as recoverable
/// by the core.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("no element matched `{0}`")]
    NotFound(String),

    #[error("stale element reference")]
    Stale,

    #[error("webdriver transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webdriver protocol error: {0}")]
    Protocol(String),
}

/// Pipeline-level failure classification
#[derive(Debug, Error)]
pub enum StepError {
    /// Malformed or incomplete listing entry. Local: skip the entry,
    /// continue the scan.
    #[error("listing entry could not be parsed: {0}")]
    Parse(String),

    /// The held-event scan blew up. Fail-open: caller assumes no conflict.
    #[error("held-event scan failed: {0}")]
    ConflictScan(String),

    /// Element lookup or interaction failed mid-step. Drives a retry in the
    /// claim executor or a "no candidates" result while scanning.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// The challenge guess was wrong or could not be produced. Drives a
    /// claim retry, never escalated.
    #[error("challenge guess rejected")]
    ChallengeMismatch,

    /// All claim attempts used up. Reported to the poll loop as an ordinary
    /// failure; the loop continues.
    #[error("claim abandoned after {0} attempts")]
    ClaimExhausted(u8),

    /// Login rejected or session invalidated. The only class that can end
    /// the run, and only after the recovery ladder is exhausted.
    #[error("session failure: {0}")]
    Session(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_error_wraps_into_step_error() {
        let step: StepError = AccessError::NotFound("#vcodeImg".into()).into();
        assert!(matches!(step, StepError::Access(AccessError::NotFound(_))));
    }

    #[test]
    fn test_error_messages_name_the_failure() {
        let e = StepError::ClaimExhausted(3);
        assert_eq!(e.to_string(), "claim abandoned after 3 attempts");
        let e = AccessError::NotFound(".activity-container".into());
        assert!(e.to_string().contains(".activity-container"));
    }
}
