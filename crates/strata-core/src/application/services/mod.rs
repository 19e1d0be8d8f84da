//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "generate every API of a feature".

pub mod generation_service;
pub mod patch_service;

pub use generation_service::{
    FeatureReport, GenerationReport, GenerationRequest, GenerationService, SampleCache,
    UnitOutcome, UnitReport, batch_size,
};
pub use patch_service::{PatchEngine, PatchOutcome};
