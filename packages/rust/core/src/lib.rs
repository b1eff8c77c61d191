//! Core pipeline orchestration and domain logic for bmad-convert.
//!
//! This crate ties together manifest reading, source loading, reference
//! resolution, entity conversion and output writing into one end-to-end
//! run ([`pipeline::convert`]).

pub mod assembler;
pub mod convert;
pub mod loader;
pub mod pipeline;
pub mod resolver;

pub use pipeline::{ConversionSummary, ConvertOptions, ProgressReporter, SilentProgress, convert};
