/// Session establishment
///
/// Logs into the unified-auth portal and leaves the page positioned on the
/// listing view. The login form has shipped under several different markups,
/// so every control is discovered through an ordered probe chain rather than
/// a single selector.

use crate::page::{first_match, PageAccessor, Probe};
use crate::settings::{AUTH_HOST_MARKER, Config, LOGIN_PATH_MARKER, PORTAL_URL};
use anyhow::Result;
use std::thread;

const USERNAME_PROBES: [Probe; 5] = [
    Probe { label: "unified-auth id", selector: "#username" },
    Probe { label: "unified-auth name", selector: "input[name='username']" },
    Probe { label: "legacy class", selector: ".input-username-pc input" },
    Probe { label: "placeholder", selector: "input[placeholder*='号']" },
    Probe { label: "any text input", selector: "input[type='text']" },
];

const PASSWORD_PROBES: [Probe; 4] = [
    Probe { label: "unified-auth id", selector: "#password" },
    Probe { label: "unified-auth name", selector: "input[name='password']" },
    Probe { label: "any password input", selector: "input[type='password']" },
    Probe { label: "legacy class", selector: ".input-password-pc input" },
];

const SUBMIT_PROBES: [Probe; 4] = [
    Probe { label: "submit button", selector: "button[type='submit']" },
    Probe { label: "legacy class", selector: ".login-button-pc" },
    Probe { label: "submit input", selector: "input[type='submit']" },
    Probe { label: "any button", selector: "button" },
];

/// Session Provider capability. `Ok(true)` means the page accessor is
/// positioned on the listing view.
pub trait SessionProvider {
    fn login<P: PageAccessor>(&self, page: &P) -> Result<bool>;
}

pub struct PortalSession {
    cfg: Config,
}

impl PortalSession {
    pub fn new(cfg: &Config) -> Self {
        Self { cfg: cfg.clone() }
    }

    fn attempt<P: PageAccessor>(&self, page: &P) -> Result<bool, crate::errors::AccessError> {
        let t = &self.cfg.timeouts;

        println!("loading login page...");
        page.goto(PORTAL_URL)?;
        thread::sleep(t.page_load);
        println!("current location: {}", page.current_location()?);

        let Some((username, probe)) = first_match(page, &USERNAME_PROBES, t.retry_delay) else {
            eprintln!("could not locate the username input");
            dump_debug_artifacts(page, "debug_page_source.html", "debug_login.png");
            return Ok(false);
        };
        println!("username input found via {} ({})", probe.label, probe.selector);
        page.clear(&username)?;
        page.type_text(&username, &self.cfg.card_number)?;

        let Some((password, probe)) = first_match(page, &PASSWORD_PROBES, t.retry_delay) else {
            eprintln!("could not locate the password input");
            return Ok(false);
        };
        println!("password input found via {} ({})", probe.label, probe.selector);
        page.type_text(&password, &self.cfg.password)?;

        let Some((submit, probe)) = first_match(page, &SUBMIT_PROBES, t.retry_delay) else {
            eprintln!("could not locate the login button");
            return Ok(false);
        };
        println!("login button found via {} ({})", probe.label, probe.selector);
        submit_and_wait(page, &submit, t.login_redirect)?;

        // Still on an auth page means the credentials were rejected.
        let location = page.current_location()?;
        if location.contains(AUTH_HOST_MARKER) || location.contains(LOGIN_PATH_MARKER) {
            eprintln!("login rejected, check card number and password");
            Ok(false)
        } else {
            println!("login ok");
            Ok(true)
        }
    }
}

impl SessionProvider for PortalSession {
    /// Access failures during login are absorbed into `Ok(false)`: the
    /// caller decides whether to retry or abort, not this layer.
    fn login<P: PageAccessor>(&self, page: &P) -> Result<bool> {
        match self.attempt(page) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                eprintln!("login failed: {e}");
                dump_debug_artifacts(page, "error_page_source.html", "error_login.png");
                Ok(false)
            }
        }
    }
}

fn submit_and_wait<P: PageAccessor>(
    page: &P,
    submit: &crate::page::ElementRef,
    redirect_wait: std::time::Duration,
) -> Result<(), crate::errors::AccessError> {
    page.click(submit)?;
    println!("credentials submitted, waiting for redirect...");
    thread::sleep(redirect_wait);
    Ok(())
}

/// Keep a copy of what the browser was showing when login went sideways:
/// the page source plus a screenshot, each best-effort.
fn dump_debug_artifacts<P: PageAccessor>(page: &P, source_path: &str, shot_path: &str) {
    if let Ok(source) = page.source() {
        if std::fs::write(source_path, source).is_ok() {
            println!("saved page source to {source_path}");
        }
    }
    if let Ok(png) = page.screenshot() {
        if std::fs::write(shot_path, png).is_ok() {
            println!("saved screenshot to {shot_path}");
        }
    }
}
