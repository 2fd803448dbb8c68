//! # Campaign Pipeline
//!
//! AI-assisted marketing campaign generation: brand analysis, content
//! strategy, message and asset generation, sequence composition, and
//! platform exports.
//!
//! The crate is organized around a straight-line workflow engine. Each
//! [`Step`] populates one slot of a shared [`WorkflowState`]; a failing step
//! logs one error and the run continues, so a single provider outage costs
//! one slot rather than the whole campaign.
//!
//! ## Core Concepts
//!
//! - **[`WorkflowEngine`]** — runs an ordered list of steps over a state bag,
//!   isolating per-step failures into the state's error log.
//! - **[`RunCtx`]** — shared run context (HTTP client, generation service,
//!   backoff, pacing, cancellation, optional event handler).
//! - **[`SequenceComposer`]** — turns generated messages into an ordered
//!   [`CampaignFlow`] with delays, conditions, and segmentation.
//! - **[`ExportFormat`]** — renders a flow for Klaviyo, Mailchimp, or
//!   generic JSON/CSV import, idempotently.
//! - **[`AssetPackager`]** — organizes generated content into platform kits
//!   and ready-to-launch campaign sets.
//!
//! ## Quick Start
//!
//! ```no_run
//! use campaign_pipeline::{RunCtx, run_marketing_automation};
//! use campaign_pipeline::generation::RemoteGeneration;
//! use campaign_pipeline::types::{CampaignParameters, CampaignType};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = RunCtx::builder()
//!         .service(Arc::new(RemoteGeneration::new("http://localhost:11434", "llama3.1")))
//!         .build();
//!
//!     let params = CampaignParameters::new(
//!         "https://example-store.com",
//!         CampaignType::CartAbandonment,
//!     )
//!     .with_counts(3, 2);
//!
//!     let result = run_marketing_automation(&ctx, params).await?;
//!     if let Some(flow) = &result.campaign_flow {
//!         println!("composed {} steps", flow.step_count());
//!     }
//!     for error in &result.errors {
//!         eprintln!("step failed: {error}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! [`Step`]: engine::Step
//! [`CampaignFlow`]: flow::CampaignFlow

pub mod brand;
pub mod compose;
pub mod engine;
pub mod error;
pub mod events;
pub mod export;
pub mod flow;
pub mod generation;
pub mod memory;
pub mod package;
pub mod parse;
pub mod run_ctx;
pub mod state;
pub mod steps;
pub mod strategy;
pub mod types;

pub use compose::SequenceComposer;
pub use engine::{Step, WorkflowEngine, WorkflowEngineBuilder};
pub use error::{EngineError, Result};
pub use export::ExportFormat;
pub use memory::CampaignMemory;
pub use package::AssetPackager;
pub use run_ctx::{RunCtx, RunCtxBuilder};
pub use state::WorkflowState;
pub use steps::{run_content_generation, run_marketing_automation};
pub use types::{CampaignParameters, CampaignType, RunResult};
