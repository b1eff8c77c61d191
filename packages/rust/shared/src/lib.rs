//! Shared types, error model, naming and configuration for bmad-convert.
//!
//! This crate is the foundation depended on by all other bmad-convert crates.
//! It provides:
//! - [`ConverterError`]: the unified error type
//! - [`CanonicalId`] and [`normalize`]: the single identifier generator
//! - Domain types ([`SourceEntity`], [`DirectiveFile`], [`DocumentFile`], [`Target`])
//! - Configuration ([`AppConfig`], [`FlavorOptions`], config loading)

pub mod config;
pub mod error;
pub mod naming;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ClaudeConfig, DefaultsConfig, FlavorOptions, OpenCodeConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{ConverterError, Result};
pub use naming::{CORE_MODULE, CanonicalId, ID_PREFIX, normalize};
pub use types::{
    Activation, Agent, CURRENT_SCHEMA_VERSION, DirectiveFile, DocumentFile, FrontMatter,
    MenuItem, MenuRef, OutputArtifact, Persona, RefKind, SourceEntity, SourceKind, Target, Task,
    Workflow, WorkflowConfig, WorkflowStep,
};
