use std::path::Path;

pub mod calculator;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod utils;

pub use calculator::{Calculator, Descriptor};
pub use config::Config;
pub use descriptors::DescriptorEngine;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, Records, Stage};
pub use record::{DescribedRecord, Record};
pub use utils::{count_lines, to_file};

/// describe every line of `input` with the built-in [DescriptorEngine] and
/// write the results to `output`, returning the number of records written
pub fn describe_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &Config,
) -> Result<usize> {
    let pipeline = Pipeline::with_config(DescriptorEngine::new, config)?;
    let records = if config.progress {
        pipeline.from_file_counted(input)?
    } else {
        pipeline.from_file(input, None)?
    };
    to_file(records, output)
}
