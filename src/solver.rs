/// Challenge solving
///
/// The claim transaction includes an image captcha. The solver contract is a
/// pure function from image bytes to a best-effort text guess; accuracy is
/// not guaranteed and wrong guesses are absorbed by the claim retry loop.
///
/// The production implementation posts the image to a ddddocr-compatible
/// HTTP service (the OCR model the portal's captcha is known to fall to).

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

pub trait ChallengeSolver {
    /// Best-effort text guess for a captcha image. No accuracy contract.
    fn solve(&self, image: &[u8]) -> Result<String>;
}

/// The portal inlines the captcha as a data URI. Strip the transport
/// encoding here so the solver contract stays a plain byte buffer.
pub fn decode_inline_image(src: &str) -> Result<Vec<u8>> {
    let (_, payload) = src
        .split_once("base64,")
        .ok_or_else(|| anyhow!("image source carries no inline base64 payload"))?;
    STANDARD
        .decode(payload.trim())
        .context("inline image payload is not valid base64")
}

// ============================================================================
// HTTP OCR solver
// ============================================================================

#[derive(Debug, Deserialize)]
struct OcrResponse {
    result: String,
}

/// Blocking client for a ddddocr HTTP frontend: POST a base64 image, get a
/// text guess back.
pub struct HttpOcrSolver {
    client: Client,
    url: String,
}

impl HttpOcrSolver {
    pub fn new(url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, url: url.to_string() }
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }
}

impl ChallengeSolver for HttpOcrSolver {
    fn solve(&self, image: &[u8]) -> Result<String> {
        let body = serde_json::json!({ "image": STANDARD.encode(image) });
        let resp: OcrResponse = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .context("OCR service unreachable")?
            .error_for_status()
            .context("OCR service rejected the image")?
            .json()
            .context("OCR service returned a malformed response")?;
        Ok(resp.result.trim().to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
