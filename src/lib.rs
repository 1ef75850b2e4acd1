//! lecture_sniper - automatic claimer for scarce, time-boxed lecture
//! reservations. Scans the portal listing, filters and ranks candidates,
//! then races to complete the captcha-guarded claim transaction.

pub mod claim;
pub mod conflict;
pub mod driver;
pub mod errors;
pub mod filter;
pub mod models;
pub mod page;
pub mod parser;
pub mod rank;
pub mod runner;
pub mod scanner;
pub mod session;
pub mod settings;
pub mod solver;

pub use errors::{AccessError, StepError};
pub use models::{ClaimOutcome, Event, EventStatus, RunOutcome};
pub use settings::{Config, Timeouts};
