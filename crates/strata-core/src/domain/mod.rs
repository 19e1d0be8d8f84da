//! Core domain layer for strata.
//!
//! Pure generation logic: sample inference, class naming, Dart emission and
//! the aggregate document model. Nothing here touches the filesystem; the
//! application layer reads inputs and writes outputs through ports.
//!
//! ## Pipeline
//!
//! ```text
//! sample JSON ──infer──▶ ObjectShape ──walk──▶ ClassDecl* ──emit──▶ files + fragments
//!                                      │
//!                           ClassNameRegistry (one per API)
//! ```

pub mod aggregate;
pub mod api;
pub mod emit;
pub mod error;
pub mod ident;
pub mod inference;
pub mod naming;
pub mod project;

pub use aggregate::{AggregateDocument, BlockKey, Placement, SectionSkeleton, Skeleton};
pub use api::{
    ApiDefinition, ApiEntry, CacheStrategy, HttpMethod, PathTemplate, RawApiConfig, ReturnData,
    name_clashes,
};
pub use emit::{ApiArtifacts, ApiInput, ArtifactFragment, GeneratedFile, emit_api, preview};
pub use error::{DomainError, ErrorCategory};
pub use inference::{
    ObjectShape, Primitive, SampleDocument, SampleValue, TypeSpec, infer, infer_document,
    infer_sample,
};
pub use naming::{ArtifactKind, ClassNameRegistry, TypePath};
pub use project::{FeatureConfig, GeneratorSettings, PageConfig, PageLayout};
