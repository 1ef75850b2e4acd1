/// WebDriver-backed page accessor
///
/// Speaks the W3C WebDriver wire protocol (JSON over HTTP) against a local
/// chromedriver. This is the only `PageAccessor` implementation that touches
/// a real browser; everything above it is transport-agnostic.

use crate::errors::AccessError;
use crate::page::{ElementRef, PageAccessor};
use crate::settings::Config;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// W3C element identifier key in wire responses.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const CSS: &str = "css selector";

pub struct WebDriver {
    client: Client,
    base: String,
    session: String,
}

impl WebDriver {
    /// Create a browser session against the configured WebDriver endpoint.
    pub fn connect(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        let mut args = vec![
            "--disable-gpu".to_string(),
            "--window-size=1920x1080".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
        ];
        if cfg.headless {
            args.push("--headless=new".to_string());
        }

        let caps = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        });

        let base = cfg.webdriver_url.trim_end_matches('/').to_string();
        let resp: Value = client
            .post(format!("{base}/session"))
            .json(&caps)
            .send()
            .with_context(|| format!("WebDriver endpoint unreachable at {base}"))?
            .json()
            .context("WebDriver returned a malformed session response")?;

        let session = resp["value"]["sessionId"]
            .as_str()
            .with_context(|| format!("WebDriver refused the session: {resp}"))?
            .to_string();

        Ok(Self { client, base, session })
    }

    /// Tear down the browser session. Errors are ignored; the process is on
    /// its way out when this runs.
    pub fn quit(&self) {
        let _ = self
            .client
            .delete(format!("{}/session/{}", self.base, self.session))
            .send();
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/session/{}{}", self.base, self.session, tail)
    }

    fn post(&self, tail: &str, body: Value) -> Result<Value, AccessError> {
        let resp = self.client.post(self.url(tail)).json(&body).send()?;
        unwrap_value(resp)
    }

    fn get(&self, tail: &str) -> Result<Value, AccessError> {
        let resp = self.client.get(self.url(tail)).send()?;
        unwrap_value(resp)
    }

    fn find_in(&self, tail: &str, selector: &str) -> Result<Vec<ElementRef>, AccessError> {
        let value = self.post(tail, json!({ "using": CSS, "value": selector }))?;
        let handles = value
            .as_array()
            .ok_or_else(|| AccessError::Protocol(format!("expected element array, got {value}")))?
            .iter()
            .filter_map(|el| el[ELEMENT_KEY].as_str())
            .map(|id| ElementRef(id.to_string()))
            .collect();
        Ok(handles)
    }
}

/// Unpack a wire response, mapping WebDriver error codes onto the access
/// taxonomy the core understands.
fn unwrap_value(resp: reqwest::blocking::Response) -> Result<Value, AccessError> {
    let status = resp.status();
    let body: Value = resp.json()?;
    if status.is_success() {
        return Ok(body["value"].clone());
    }
    let code = body["value"]["error"].as_str().unwrap_or("unknown");
    let message = body["value"]["message"].as_str().unwrap_or("").to_string();
    match code {
        "no such element" => Err(AccessError::NotFound(message)),
        "stale element reference" => Err(AccessError::Stale),
        _ => Err(AccessError::Protocol(format!("{code}: {message}"))),
    }
}

impl PageAccessor for WebDriver {
    fn find_all(&self, selector: &str) -> Result<Vec<ElementRef>, AccessError> {
        self.find_in("/elements", selector)
    }

    fn find_all_within(
        &self,
        root: &ElementRef,
        selector: &str,
    ) -> Result<Vec<ElementRef>, AccessError> {
        self.find_in(&format!("/element/{}/elements", root.0), selector)
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
        let value = self.get(&format!("/element/{}/text", el.0))?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn attribute(&self, el: &ElementRef, name: &str) -> Result<String, AccessError> {
        let value = self.get(&format!("/element/{}/attribute/{name}", el.0))?;
        // Absent attributes come back as null.
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn click(&self, el: &ElementRef) -> Result<(), AccessError> {
        self.post(&format!("/element/{}/click", el.0), json!({}))?;
        Ok(())
    }

    fn type_text(&self, el: &ElementRef, text: &str) -> Result<(), AccessError> {
        self.post(&format!("/element/{}/value", el.0), json!({ "text": text }))?;
        Ok(())
    }

    fn clear(&self, el: &ElementRef) -> Result<(), AccessError> {
        self.post(&format!("/element/{}/clear", el.0), json!({}))?;
        Ok(())
    }

    fn goto(&self, url: &str) -> Result<(), AccessError> {
        self.post("/url", json!({ "url": url }))?;
        Ok(())
    }

    fn refresh(&self) -> Result<(), AccessError> {
        self.post("/refresh", json!({}))?;
        Ok(())
    }

    fn current_location(&self) -> Result<String, AccessError> {
        let value = self.get("/url")?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn source(&self) -> Result<String, AccessError> {
        let value = self.get("/source")?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn screenshot(&self) -> Result<Vec<u8>, AccessError> {
        // The wire protocol delivers the PNG as a base64 string.
        let value = self.get("/screenshot")?;
        let payload = value.as_str().unwrap_or_default();
        STANDARD
            .decode(payload)
            .map_err(|e| AccessError::Protocol(format!("screenshot payload is not base64: {e}")))
    }
}
