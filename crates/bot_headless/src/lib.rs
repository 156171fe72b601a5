//! Headless match runner for the production controller.
//!
//! This crate plays the controller against a deterministic mock game
//! without a live game connection. This enables:
//!
//! - **Strategy checks**: Validate RON strategy files before shipping them
//! - **Smoke matches**: Watch a strategy build up over a full match
//! - **Batch runs**: Compare many seeds in parallel and verify determinism
//!
//! # Example
//!
//! ```bash
//! # Validate a strategy file
//! cargo run -p bot_headless -- validate assets/strategies/gateway_macro.ron
//!
//! # Play one match and print the summary as JSON
//! cargo run -p bot_headless -- run --seed 7
//!
//! # Play 64 seeds in parallel
//! cargo run -p bot_headless -- batch --count 64 --output results/
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod error;
pub mod metrics;
pub mod mock;
pub mod runner;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use error::HeadlessError;
pub use metrics::{BatchSummary, FinalState, MatchSummary};
pub use mock::{GridPlacement, MockGame};
pub use runner::{run_match, MatchRunner, MatchSettings, DEFAULT_MAX_TICKS};
