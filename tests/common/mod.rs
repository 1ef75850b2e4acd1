// Shared test doubles: an in-memory page accessor that behaves like the
// listing view (entries, challenge dialog, success marker) and scripted
// challenge solvers.

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use lecture_sniper::errors::AccessError;
use lecture_sniper::page::{ElementRef, PageAccessor};
use lecture_sniper::session::SessionProvider;
use lecture_sniper::settings::{
    ACTION_BUTTON_SELECTOR, CATEGORY_SELECTOR, CHALLENGE_IMAGE_SELECTOR,
    CHALLENGE_INPUT_SELECTOR, CONFIRM_BUTTON_SELECTOR, Config, DETAIL_TEXT_SELECTOR,
    ENTRY_SELECTOR, ERROR_DIALOG_BUTTON_SELECTOR, TITLE_SELECTOR, Timeouts, VENUE_SELECTOR,
};
use lecture_sniper::solver::ChallengeSolver;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

/// Config with portal-shaped rules but timings safe for a test run.
pub fn test_config() -> Config {
    Config {
        card_number: "213230001".into(),
        password: "hunter2".into(),
        webdriver_url: "http://localhost:9515".into(),
        ocr_url: "http://127.0.0.1:9898/ocr".into(),
        headless: true,
        preferred_titles: vec![],
        required_categories: vec!["人文与科学素养系列讲座_法律".into()],
        preferred_campuses: vec!["九龙湖校区".into()],
        online_enabled: true,
        offline_enabled: true,
        max_claim_attempts: 3,
        timeouts: Timeouts {
            page_load: Duration::from_millis(1),
            element_wait: Duration::from_millis(40),
            login_redirect: Duration::from_millis(1),
            scan_interval: Duration::from_millis(5),
            retry_delay: Duration::from_millis(5),
            action_confirm: Duration::from_millis(1),
        },
    }
}

// ============================================================================
// Fake listing page
// ============================================================================

#[derive(Debug, Clone)]
pub struct FakeEntry {
    pub category: String,
    pub title: String,
    pub venue: String,
    pub schedule: String,
    pub button_label: String,
}

impl FakeEntry {
    pub fn new(
        category: &str,
        title: &str,
        venue: &str,
        start: &str,
        end: &str,
        button_label: &str,
    ) -> Self {
        Self {
            category: category.into(),
            title: title.into(),
            venue: venue.into(),
            schedule: format!("时间：{start} 至 {end}"),
            button_label: button_label.into(),
        }
    }
}

/// In-memory stand-in for the rendered listing. The claim flow is modeled:
/// clicking a claimable entry's button opens the challenge dialog, typing
/// the expected code and confirming sets the success marker.
pub struct FakePage {
    pub entries: RefCell<Vec<FakeEntry>>,
    pub expected_code: String,
    pub image_bytes: Vec<u8>,
    pub challenge_open: Cell<bool>,
    pub typed_code: RefCell<String>,
    pub claimed: Cell<bool>,
    pub clicks: RefCell<Vec<String>>,
    pub location: RefCell<String>,
    pub refreshes: Cell<u32>,
    /// Remaining refresh calls that should fail (session-loss simulation).
    pub refresh_failures: Cell<u32>,
}

impl FakePage {
    pub fn new(entries: Vec<FakeEntry>, expected_code: &str) -> Self {
        Self {
            entries: RefCell::new(entries),
            expected_code: expected_code.into(),
            image_bytes: b"fake-captcha-png".to_vec(),
            challenge_open: Cell::new(false),
            typed_code: RefCell::new(String::new()),
            claimed: Cell::new(false),
            clicks: RefCell::new(Vec::new()),
            location: RefCell::new("https://ehall.example.edu/index.do#/hdyy".into()),
            refreshes: Cell::new(0),
            refresh_failures: Cell::new(0),
        }
    }

    pub fn trigger_clicks(&self) -> usize {
        self.clicks.borrow().iter().filter(|c| c.ends_with(":button")).count()
    }

    pub fn confirm_clicks(&self) -> usize {
        self.clicks.borrow().iter().filter(|c| *c == "confirm").count()
    }

    fn entry_index(&self, el: &ElementRef) -> Option<usize> {
        el.0.strip_prefix("entry:")?
            .split(':')
            .next()?
            .parse()
            .ok()
    }

    /// Document-wide singles that exist right now, given dialog state.
    fn global_single(&self, selector: &str) -> Vec<ElementRef> {
        let open = self.challenge_open.get();
        match selector {
            CHALLENGE_IMAGE_SELECTOR if open => vec![ElementRef("vcode_img".into())],
            CHALLENGE_INPUT_SELECTOR if open => vec![ElementRef("vcode_input".into())],
            CONFIRM_BUTTON_SELECTOR if open => vec![ElementRef("confirm".into())],
            ERROR_DIALOG_BUTTON_SELECTOR => vec![],
            _ => vec![],
        }
    }
}

impl PageAccessor for FakePage {
    fn find_all(&self, selector: &str) -> Result<Vec<ElementRef>, AccessError> {
        if selector == ENTRY_SELECTOR {
            let n = self.entries.borrow().len();
            return Ok((0..n).map(|i| ElementRef(format!("entry:{i}"))).collect());
        }
        Ok(self.global_single(selector))
    }

    fn find_all_within(
        &self,
        root: &ElementRef,
        selector: &str,
    ) -> Result<Vec<ElementRef>, AccessError> {
        let Some(i) = self.entry_index(root) else {
            return Ok(vec![]);
        };
        let refs = match selector {
            CATEGORY_SELECTOR => vec![ElementRef(format!("entry:{i}:category"))],
            TITLE_SELECTOR => vec![ElementRef(format!("entry:{i}:title"))],
            VENUE_SELECTOR => vec![ElementRef(format!("entry:{i}:venue"))],
            DETAIL_TEXT_SELECTOR => vec![
                ElementRef(format!("entry:{i}:detail:0")),
                ElementRef(format!("entry:{i}:detail:1")),
            ],
            ACTION_BUTTON_SELECTOR => vec![ElementRef(format!("entry:{i}:button"))],
            _ => vec![],
        };
        Ok(refs)
    }

    fn find_one(&self, root: &ElementRef, selector: &str) -> Result<ElementRef, AccessError> {
        self.find_all_within(root, selector)?
            .into_iter()
            .next()
            .ok_or_else(|| AccessError::NotFound(selector.to_string()))
    }

    fn find(&self, selector: &str) -> Result<ElementRef, AccessError> {
        self.find_all(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| AccessError::NotFound(selector.to_string()))
    }

    fn text(&self, el: &ElementRef) -> Result<String, AccessError> {
        if let Some(i) = self.entry_index(el) {
            let entries = self.entries.borrow();
            let entry = entries.get(i).ok_or(AccessError::Stale)?;
            let field = el.0.splitn(3, ':').nth(2).unwrap_or_default();
            let value = match field {
                "category" => entry.category.clone(),
                "title" => entry.title.clone(),
                "venue" => entry.venue.clone(),
                "detail:0" => "主讲人：佚名".to_string(),
                "detail:1" => entry.schedule.clone(),
                "button" => entry.button_label.clone(),
                other => return Err(AccessError::NotFound(other.to_string())),
            };
            return Ok(value);
        }
        Err(AccessError::Stale)
    }

    fn attribute(&self, el: &ElementRef, name: &str) -> Result<String, AccessError> {
        if el.0 == "vcode_img" && name == "src" {
            return Ok(format!(
                "data:image/png;base64,{}",
                STANDARD.encode(&self.image_bytes)
            ));
        }
        Ok(String::new())
    }

    fn click(&self, el: &ElementRef) -> Result<(), AccessError> {
        self.clicks.borrow_mut().push(el.0.clone());
        if el.0.ends_with(":button") {
            if let Some(i) = self.entry_index(el) {
                if self.entries.borrow()[i].button_label == "预约" {
                    self.challenge_open.set(true);
                }
            }
        } else if el.0 == "confirm" {
            if *self.typed_code.borrow() == self.expected_code {
                self.claimed.set(true);
            }
            self.challenge_open.set(false);
        }
        Ok(())
    }

    fn type_text(&self, el: &ElementRef, text: &str) -> Result<(), AccessError> {
        if el.0 == "vcode_input" {
            self.typed_code.borrow_mut().push_str(text);
        }
        Ok(())
    }

    fn clear(&self, el: &ElementRef) -> Result<(), AccessError> {
        if el.0 == "vcode_input" {
            self.typed_code.borrow_mut().clear();
        }
        Ok(())
    }

    fn goto(&self, url: &str) -> Result<(), AccessError> {
        *self.location.borrow_mut() = url.to_string();
        Ok(())
    }

    fn refresh(&self) -> Result<(), AccessError> {
        let remaining = self.refresh_failures.get();
        if remaining > 0 {
            self.refresh_failures.set(remaining - 1);
            return Err(AccessError::Protocol("browser session gone".into()));
        }
        self.refreshes.set(self.refreshes.get() + 1);
        Ok(())
    }

    fn current_location(&self) -> Result<String, AccessError> {
        Ok(self.location.borrow().clone())
    }

    fn source(&self) -> Result<String, AccessError> {
        if self.claimed.get() {
            Ok("<div>预约成功</div>".to_string())
        } else {
            Ok("<div>活动列表</div>".to_string())
        }
    }

    fn screenshot(&self) -> Result<Vec<u8>, AccessError> {
        Ok(b"fake-screenshot-png".to_vec())
    }
}

// ============================================================================
// Scripted solvers
// ============================================================================

/// Returns pre-arranged guesses in order; errors once the script runs out.
pub struct ScriptedSolver {
    answers: RefCell<VecDeque<String>>,
    pub calls: Cell<usize>,
}

impl ScriptedSolver {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().map(|s| s.to_string()).collect()),
            calls: Cell::new(0),
        }
    }
}

impl ChallengeSolver for ScriptedSolver {
    fn solve(&self, _image: &[u8]) -> anyhow::Result<String> {
        self.calls.set(self.calls.get() + 1);
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("solver script exhausted"))
    }
}

/// Always guesses the same wrong code.
pub struct WrongSolver {
    pub calls: Cell<usize>,
}

impl WrongSolver {
    pub fn new() -> Self {
        Self { calls: Cell::new(0) }
    }
}

impl ChallengeSolver for WrongSolver {
    fn solve(&self, _image: &[u8]) -> anyhow::Result<String> {
        self.calls.set(self.calls.get() + 1);
        Ok("0000".to_string())
    }
}

// ============================================================================
// Session stubs
// ============================================================================

/// Login always succeeds (the page is assumed already positioned).
pub struct NoopSession;

impl SessionProvider for NoopSession {
    fn login<P: PageAccessor>(&self, _page: &P) -> anyhow::Result<bool> {
        Ok(true)
    }
}

/// Login always fails, with a call counter for recovery-ladder assertions.
pub struct DenySession {
    pub attempts: Cell<usize>,
}

impl DenySession {
    pub fn new() -> Self {
        Self { attempts: Cell::new(0) }
    }
}

impl SessionProvider for DenySession {
    fn login<P: PageAccessor>(&self, _page: &P) -> anyhow::Result<bool> {
        self.attempts.set(self.attempts.get() + 1);
        Ok(false)
    }
}
