pub mod clean;
pub mod config;
pub mod error;
pub mod export;
pub mod load;
pub mod pipeline;
pub mod table;
pub mod tag;

#[cfg(test)]
pub(crate) mod fixtures;

pub use config::PipelineConfig;
pub use error::{FatalPipelineError, LoadError, ParseError};
pub use pipeline::{run, run_tables, PipelineOutput, PipelineSummary};
