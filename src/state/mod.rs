//! State module for tracking entity assembly progress
//!
//! - `AssemblyStage`: the hop an entity is at (listing, detail, timeline, owner, body)
//! - `StageTracker`: validates and traces hops for one entity

mod assembly_stage;

pub use assembly_stage::{AssemblyStage, StageTracker};
