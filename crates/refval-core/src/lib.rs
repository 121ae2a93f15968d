pub mod categorizer;
pub mod coercion;
pub mod columns;
pub mod error;
pub mod joiner;
pub mod loader;
pub mod normalizer;
pub mod pipeline;
pub mod profiler;
pub mod reporter;
pub mod tables;
pub mod text;
pub mod timestamps;
pub mod validator;

pub use error::{LoadError, PipelineError, Result};
pub use loader::Datasets;
pub use pipeline::{run, PipelineConfig, RunSummary};
pub use tables::{Table, TableSpec};
