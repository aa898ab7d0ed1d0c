//! Sonar / hydrophone / compass fusion into a single threat state.

pub mod orchestrator;

pub use orchestrator::{FusionConfig, FusionEngine, FUSION_HISTORY};
