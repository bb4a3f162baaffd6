pub mod parse_provider;
pub mod tile_features;

use std::{path::Path, time::Instant};
use log::{debug, error, info};

use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Cached,
    Built,
}

fn logged<T>(etl_name: &str, stage: &str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        error!(etl_name = etl_name, stage = stage, err = err.message.as_str(); "ETL stage failed");
    }
    result
}

/// A cached extract/transform/load stage writing its output into a directory.
pub trait Etl {
    type Input;
    type Output;

    fn etl_name(&self) -> &str;

    fn is_cached(&self, dir: &Path) -> Result<bool>;
    fn clean(&self, dir: &Path) -> Result<()>;

    fn extract(&mut self, dir: &Path) -> Result<Self::Input>;
    fn transform(&mut self, input: Self::Input) -> Result<Self::Output>;
    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()>;

    fn process(&mut self, dir: &Path) -> Result<ProcessOutcome> {
        let etl_name = self.etl_name().to_string();
        if self.is_cached(dir)? {
            info!(etl_name = etl_name.as_str(); "Using cached value");
            return Ok(ProcessOutcome::Cached);
        }

        let started = Instant::now();
        debug!(etl_name = etl_name.as_str(); "Extracting");
        let input = logged(&etl_name, "extract", self.extract(dir))?;
        debug!(etl_name = etl_name.as_str(); "Transforming");
        let output = logged(&etl_name, "transform", self.transform(input))?;
        debug!(etl_name = etl_name.as_str(); "Loading");
        if let Err(err) = logged(&etl_name, "load", self.load(dir, output)) {
            // A half-written output would read as a cache hit next run.
            if let Err(clean_err) = self.clean(dir) {
                error!(etl_name = etl_name.as_str(), err = clean_err.message.as_str(); "Cleanup after failed load failed");
            }
            return Err(err);
        }

        info!(etl_name = etl_name.as_str(), elapsed_ms = started.elapsed().as_millis() as u64; "Process finished");
        Ok(ProcessOutcome::Built)
    }
}
