//! # quizpack-harvest
//!
//! One-shot harvester for question manager quizpacks. A run:
//!
//! 1. discovers quizpack keys under a fixed list of category filters,
//! 2. fetches every quizpack's records on a bounded worker pool,
//! 3. looks up each record's answer options on a second, wider pool,
//! 4. writes the merged rows to a CSV file.
//!
//! Key discovery failures abort the run. A failed quizpack fetch drops only that
//! quizpack; a failed option lookup keeps the record with an empty option set.
//!
//! ## Quick Start
//!
//! ```no_run
//! use quizpack_harvest::{Config, Harvester};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.api.session_cookie = "your-session-cookie".to_string();
//!
//!     let harvester = Harvester::new(config)?;
//!
//!     let mut events = harvester.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = harvester.run().await?;
//!     println!("wrote {} rows", summary.rows);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Question manager API client
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Harvest pipeline
pub mod harvest;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use client::{HttpQuizApi, QuizApi};
pub use config::{ApiConfig, Config, DuplicateKeyPolicy, PipelineConfig};
pub use error::{Error, Result};
pub use harvest::{CSV_HEADER, HarvestSummary, Harvester, ResultSink};
pub use types::{EnrichedRow, Event, OptionSet, QuizpackBatch, QuizpackKey, Record, Stage};
