/// lecture_sniper - Main entry point
/// Logs into the reservation portal, then scans and claims until one claim
/// sticks or the run dies.

use anyhow::{Context, Result};
use dotenvy::dotenv;
use lecture_sniper::driver::WebDriver;
use lecture_sniper::models::RunOutcome;
use lecture_sniper::runner;
use lecture_sniper::session::{PortalSession, SessionProvider};
use lecture_sniper::settings::Config;
use lecture_sniper::solver::HttpOcrSolver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cfg = Config::from_env()?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    // The whole pipeline is a single cooperative thread of control with a
    // blocking HTTP client underneath, so it lives on a blocking thread;
    // this task stays free for signal handling.
    let mut loop_task = tokio::task::spawn_blocking(move || -> Result<RunOutcome> {
        println!("connecting to WebDriver at {}", cfg.webdriver_url);
        let page = WebDriver::connect(&cfg).context("failed to start a browser session")?;
        let solver = HttpOcrSolver::new(&cfg.ocr_url);
        let session = PortalSession::new(&cfg);

        let outcome = (|| -> Result<RunOutcome> {
            if !session.login(&page)? {
                eprintln!("login failed, nothing to do");
                return Ok(RunOutcome::Aborted);
            }
            println!("starting the scan loop...");
            runner::run(&page, &solver, &session, &cfg, &stop_flag)
        })();

        // Browser session goes down on every exit path.
        page.quit();
        println!("browser session closed");
        outcome
    });

    let outcome = tokio::select! {
        res = &mut loop_task => res?,
        _ = tokio::signal::ctrl_c() => {
            println!("\ninterrupt received, stopping after the current cycle");
            stop.store(true, Ordering::Relaxed);
            loop_task.await?
        }
    }?;

    match outcome {
        RunOutcome::Claimed => println!("done: reservation secured"),
        RunOutcome::Stopped => println!("done: stopped by operator"),
        RunOutcome::Aborted => println!("done: gave up on an unrecoverable session"),
    }
    Ok(())
}
