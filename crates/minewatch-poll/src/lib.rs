//! Minewatch Poll: follow a remote analysis job to completion
//!
//! Fetches the job status on a fixed schedule, folds each response into an
//! [`AnalysisSnapshot`](minewatch_core::AnalysisSnapshot) and stops once the
//! backend reports completion or failure.
//!
//! # Example
//!
//! ```ignore
//! use minewatch_core::AnalysisSnapshot;
//! use minewatch_poll::{HttpStatusSource, PollConfig, PollOutcome, Poller};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = PollConfig::from_env()?;
//! let source = HttpStatusSource::new(&config.base_url)?;
//! let poller = Poller::new(source, config);
//!
//! let snapshot = AnalysisSnapshot::begin("an-123", chrono::Utc::now());
//! match poller.run(snapshot, CancellationToken::new()).await {
//!     PollOutcome::Completed { payload, .. } => println!("{}", payload),
//!     PollOutcome::Failed { reason, .. } => eprintln!("{}", reason),
//!     PollOutcome::Errored { snapshot, error } => eprintln!("{} at {}%", error, snapshot.progress),
//!     PollOutcome::Cancelled { .. } => {}
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod poller;
pub mod source;
pub mod status;
pub mod steps;

pub use config::PollConfig;
pub use error::PollError;
pub use http::HttpStatusSource;
pub use poller::{PollOutcome, Poller};
pub use source::StatusSource;
pub use status::{decide, PollDecision, StatusPayload};
pub use steps::{current_step_index, step_state, AnalysisStep, StepState, ANALYSIS_STEPS};
