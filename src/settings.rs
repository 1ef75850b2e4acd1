/// Settings and configuration management
/// Handles environment variable loading and validation

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

// ============================================================================
// Portal Constants
// ============================================================================

/// Reservation portal entry point. The fragment routes straight to the
/// activity listing view.
pub const PORTAL_URL: &str =
    "https://ehall.seu.edu.cn/gsapp/sys/yddjzxxtjappseu/*default/index.do#/hdyy";

/// Path fragment that identifies the listing view. The claim-success
/// heuristic checks whether the browser has left this path.
pub const LISTING_PATH_MARKER: &str = "hdyy";

/// URL fragments that indicate the session bounced back to authentication.
pub const AUTH_HOST_MARKER: &str = "auth.seu.edu.cn";
pub const LOGIN_PATH_MARKER: &str = "login";

// ============================================================================
// Listing Selectors
// ============================================================================

pub const ENTRY_SELECTOR: &str = ".activity-container";
pub const CATEGORY_SELECTOR: &str = ".hdxq-hdlx .mint-text";
pub const TITLE_SELECTOR: &str = ".activity-name .mint-text";
pub const VENUE_SELECTOR: &str = "div[title='item.JZDD']";
/// Plural selector; the schedule text sits at index 1 within an entry.
pub const DETAIL_TEXT_SELECTOR: &str = ".activity-text .mint-text";
pub const ACTION_BUTTON_SELECTOR: &str = "button";

// ============================================================================
// Claim Transaction Selectors
// ============================================================================

pub const CHALLENGE_IMAGE_SELECTOR: &str = "#vcodeImg";
pub const CHALLENGE_INPUT_SELECTOR: &str = "#vcodeInput";
pub const CONFIRM_BUTTON_SELECTOR: &str = "#jqalert_yes_btn";
pub const ERROR_DIALOG_BUTTON_SELECTOR: &str = ".mint-msgbox-btn";

// ============================================================================
// Label / Marker Tokens
// ============================================================================

/// Action-button label on an entry that can still be reserved.
pub const CLAIMABLE_LABEL: &str = "预约";
/// Action-button label on an entry the user already holds (offers cancellation).
pub const HELD_LABEL: &str = "取消预约";
/// Marker in the rendered page that the claim went through.
pub const SUCCESS_MARKER: &str = "成功";
/// Titles containing this token are online events (no physical campus).
pub const ONLINE_MARKER: &str = "线上";
/// Venue prefix up to and including this token is the campus name.
pub const CAMPUS_MARKER: &str = "校区";

/// Schedule timestamps as rendered in the listing, e.g. "2025/10/01/14:00:00".
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d/%H:%M:%S";

pub const DEFAULT_CLAIM_ATTEMPTS: u8 = 3;

// ============================================================================
// Timeouts
// ============================================================================

/// All waits in the system are bounded by one of these durations. A bound
/// being exceeded is never fatal; it degrades to "not found" and the scan
/// loop proceeds.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Base settle time after a page navigation.
    pub page_load: Duration,
    /// Upper bound on element discovery.
    pub element_wait: Duration,
    /// Wait after submitting credentials before checking the redirect.
    /// Raise this (e.g. to 60s) when the browser needs a one-time SMS step.
    pub login_redirect: Duration,
    /// Pause between scan cycles.
    pub scan_interval: Duration,
    /// Pause before retrying after a failed claim attempt.
    pub retry_delay: Duration,
    /// Settle time between confirming a claim and checking the outcome.
    pub action_confirm: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            page_load: Duration::from_millis(500),
            element_wait: Duration::from_secs(3),
            login_redirect: Duration::from_secs(2),
            scan_interval: Duration::from_millis(50),
            retry_delay: Duration::from_millis(50),
            action_confirm: Duration::from_millis(200),
        }
    }
}

// ============================================================================
// Runtime Configuration (loaded from environment)
// ============================================================================

/// Immutable per-run configuration. Built once at startup and passed
/// explicitly to every component that needs it.
#[derive(Debug, Clone)]
pub struct Config {
    // Credentials
    pub card_number: String,
    pub password: String,

    // Collaborator endpoints
    pub webdriver_url: String,
    pub ocr_url: String,
    pub headless: bool,

    // Acceptance rules
    /// When non-empty, only these titles are claimed and every other rule
    /// except status and conflicts is bypassed.
    pub preferred_titles: Vec<String>,
    pub required_categories: Vec<String>,
    pub preferred_campuses: Vec<String>,
    pub online_enabled: bool,
    pub offline_enabled: bool,

    pub max_claim_attempts: u8,
    pub timeouts: Timeouts,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns errors with helpful messages if required configuration is
    /// missing. Optional values fall back to the defaults the portal was
    /// tuned for.
    pub fn from_env() -> Result<Self> {
        let card_number = env::var("CARD_NUMBER")
            .context("CARD_NUMBER env var is required. Add it to your .env file.\n\
                     This is the campus card number used for portal login.")?;
        let password = env::var("PASSWORD")
            .context("PASSWORD env var is required. Add it to your .env file.")?;

        let webdriver_url = env::var("WEBDRIVER_URL")
            .unwrap_or_else(|_| "http://localhost:9515".to_string());
        let ocr_url = env::var("OCR_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:9898/ocr".to_string());

        Ok(Self {
            card_number,
            password,
            webdriver_url,
            ocr_url,
            headless: env_parse_bool("HEADLESS", false),
            preferred_titles: env_list("PREFERRED_TITLES"),
            required_categories: {
                let cats = env_list("REQUIRED_CATEGORIES");
                if cats.is_empty() { default_categories() } else { cats }
            },
            preferred_campuses: env_list("PREFERRED_CAMPUSES"),
            online_enabled: env_parse_bool("ENABLE_ONLINE", true),
            offline_enabled: env_parse_bool("ENABLE_OFFLINE", true),
            max_claim_attempts: env_parse("MAX_CLAIM_ATTEMPTS", DEFAULT_CLAIM_ATTEMPTS),
            timeouts: Timeouts {
                page_load: env_parse_ms("PAGE_LOAD_MS", 500),
                element_wait: env_parse_ms("ELEMENT_WAIT_MS", 3_000),
                login_redirect: env_parse_ms("LOGIN_REDIRECT_MS", 2_000),
                scan_interval: env_parse_ms("SCAN_INTERVAL_MS", 50),
                retry_delay: env_parse_ms("RETRY_DELAY_MS", 50),
                action_confirm: env_parse_ms("ACTION_CONFIRM_MS", 200),
            },
        })
    }
}

/// Category labels accepted when REQUIRED_CATEGORIES is not set. These are
/// the lecture series that count toward the quality-education requirement.
fn default_categories() -> Vec<String> {
    [
        "人文与科学素养系列讲座_心理健康",
        "人文与科学素养系列讲座_法律",
        "人文与科学素养系列讲座-艺术类",
        "人文与科学素养系列讲座_其他",
        "“SEU咖啡间\"系列沙龙活动",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Parse env var with default fallback
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse boolean env var with support for "true", "1", "false", "0"
fn env_parse_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(default)
}

/// Parse a millisecond count into a Duration
fn env_parse_ms(key: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_parse(key, default_ms))
}

/// Parse a comma-separated env var into a trimmed list, empty items dropped
fn env_list(key: &str) -> Vec<String> {
    env::var(key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
