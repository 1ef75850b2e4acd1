/// Setup validation: checks that the environment configuration is complete
/// and that both collaborator services (WebDriver, OCR) are reachable.
/// Run this before the first real run.

use anyhow::Result;
use dotenvy::dotenv;
use lecture_sniper::settings::Config;
use reqwest::blocking::Client;
use std::time::Duration;

fn main() -> Result<()> {
    dotenv().ok();

    println!("=== lecture_sniper setup check ===\n");

    let cfg = match Config::from_env() {
        Ok(cfg) => {
            println!("[OK]   configuration loaded");
            cfg
        }
        Err(e) => {
            println!("[FAIL] configuration: {e:#}");
            std::process::exit(1);
        }
    };

    println!("       card number:        {}", mask(&cfg.card_number));
    println!("       preferred titles:   {}", cfg.preferred_titles.len());
    println!("       required categories: {}", cfg.required_categories.len());
    println!("       preferred campuses: {}", cfg.preferred_campuses.len());
    println!(
        "       online/offline:     {}/{}",
        cfg.online_enabled, cfg.offline_enabled
    );
    println!("       claim attempts:     {}", cfg.max_claim_attempts);

    let client = Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to create HTTP client");

    // WebDriver /status is the standard readiness probe.
    let status_url = format!("{}/status", cfg.webdriver_url.trim_end_matches('/'));
    match client.get(&status_url).send() {
        Ok(resp) if resp.status().is_success() => {
            println!("[OK]   WebDriver reachable at {}", cfg.webdriver_url);
        }
        Ok(resp) => {
            println!(
                "[WARN] WebDriver at {} answered with {}",
                cfg.webdriver_url,
                resp.status()
            );
        }
        Err(e) => {
            println!("[FAIL] WebDriver unreachable at {}: {e}", cfg.webdriver_url);
            println!("       Start chromedriver, e.g.: chromedriver --port=9515");
        }
    }

    // The OCR service only exposes the solve endpoint; any HTTP answer
    // (even a 4xx for our empty probe) proves it is listening.
    match client.post(&cfg.ocr_url).json(&serde_json::json!({})).send() {
        Ok(_) => println!("[OK]   OCR service reachable at {}", cfg.ocr_url),
        Err(e) => {
            println!("[FAIL] OCR service unreachable at {}: {e}", cfg.ocr_url);
            println!("       Start a ddddocr HTTP frontend and point OCR_URL at it");
        }
    }

    println!("\ncheck complete");
    Ok(())
}

fn mask(value: &str) -> String {
    if value.len() <= 3 {
        "***".to_string()
    } else {
        format!("{}***", &value[..3])
    }
}
