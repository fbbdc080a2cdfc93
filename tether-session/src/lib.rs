//! Tether Session
//!
//! The client-side core that turns a job definition into a runnable form
//! and follows a run to completion.
//!
//! Architecture:
//! - Inference: builds an input schema from a declared schema or an example payload
//! - Binder: seeds and edits the values entered for that schema
//! - Tracker: submits a run, polls its status and fetches results once
//! - Configuration: polling cadence and inference policy
//!
//! The provider itself is reached only through
//! [`tether_core::ProviderGateway`], so nothing here knows about transport
//! or credentials.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tether_core::ProviderGateway;
//! use tether_session::{Config, InputBinder, RunLifecycleTracker, SchemaInferenceEngine};
//!
//! # async fn example(gateway: Arc<dyn ProviderGateway>) -> anyhow::Result<()> {
//! let config = Config::default();
//! let definition = gateway.get_job_definition("apify~hello-world").await?;
//!
//! let outcome = SchemaInferenceEngine::from_config(&config).infer_definition(&definition)?;
//! let binder = InputBinder::new(outcome.into_schema());
//! let mut inputs = binder.seed();
//! binder.apply(&mut inputs, "helloWorld", "hi");
//!
//! let mut tracker = RunLifecycleTracker::new(gateway, &config);
//! let handle = tracker.submit(&definition.id, &inputs).await?;
//! let last = handle.wait().await?;
//! println!("{:?}", last);
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod config;
pub mod error;
pub mod inference;
pub mod tracker;

pub use binder::{BoundInputs, BoundValue, InputBinder, RawValue};
pub use config::Config;
pub use error::{Result, SessionError};
pub use inference::{FieldOverrides, SchemaInferenceEngine, SchemaOutcome};
pub use tracker::{RunEvent, RunHandle, RunLifecycleTracker, TrackerPhase};
