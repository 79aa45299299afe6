//! # newsreel: a checkpointed pipeline for automated short news videos
//!
//! newsreel turns a trending or user-given topic into a published short news
//! video through a fixed sequence of stages (trend pick, news consolidation,
//! script drafting, narration audio, images, video assembly, upload) with a
//! human-review gate after each major stage. The engine at the center is a
//! pausable, resumable, checkpointed state machine:
//!
//! - **State**: one flat [`state::PipelineState`] record threaded through
//!   every step, replaced (never mutated in place) by each stage
//! - **Stages**: async units of work that convert every failure into
//!   state-carried error fields instead of raising
//! - **Gates**: pause points that suspend the run pending external approval,
//!   with a self-loop while suspended and no polling anywhere
//! - **Graph**: the fixed, acyclic step order with one entry and one
//!   explicit terminal
//! - **Runner**: walks the graph node by node, yields every intermediate
//!   state, checkpoints after each step, and resumes a suspended run at the
//!   exact gate that held it
//!
//! External services (news APIs, the language model, speech synthesis, image
//! generation, rendering, publishing) sit behind the narrow traits in
//! [`providers`]; this crate orchestrates, it does not fetch.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use newsreel::config::{ReviewPolicy, Settings};
//! use newsreel::graph::PipelineGraph;
//! use newsreel::runtimes::{CheckpointerKind, Halt, PipelineRunner, new_run_id};
//! use newsreel::state::PipelineState;
//!
//! # async fn example(collaborators: newsreel::providers::Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Arc::new(Settings::from_env().with_review(ReviewPolicy::all()));
//! let graph = PipelineGraph::standard(collaborators, Arc::clone(&settings));
//! let mut runner = PipelineRunner::new(graph, settings, CheckpointerKind::JsonFile).await;
//!
//! let run_id = new_run_id();
//! runner.create_run(&run_id, PipelineState::for_topic("local election results")).await?;
//!
//! let mut outcome = runner.run_until_settled(&run_id).await?;
//! while let Halt::Suspended(_checkpoint) = outcome.halt {
//!     // Show outcome.state to a reviewer; apply edits through the state's
//!     // guarded edit methods, e.g. edit_news_summary during the news review.
//!     runner.state_mut(&run_id)?.edit_news_summary("tightened summary")?;
//!     runner.resume(&run_id).await?;
//!     outcome = runner.run_until_settled(&run_id).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod draft;
pub mod events;
pub mod gate;
pub mod graph;
pub mod providers;
pub mod runtimes;
pub mod stage;
pub mod stages;
pub mod state;
pub mod telemetry;
pub mod types;

pub use gate::Gate;
pub use state::{PipelineState, SuspendReason};
pub use types::{Checkpoint, StepId};
