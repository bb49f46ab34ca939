//
// fragcat - config.rs - validated run configuration
//
// Every field here is either supplied on the command line or defaulted by
// `clap`; `Config::validate` is the single place range checks live, so the
// CLI and any future embedder get the same guarantees.
//

use std::time::Duration;

use crate::error::Error;

pub const MIN_BUFFER_SIZE: usize = 1;
pub const MAX_BUFFER_SIZE: usize = 50;
pub const MIN_WORKERS: usize = 1;
pub const MAX_WORKERS: usize = 20;
pub const MAX_CONSUMER_DELAY_MS: u64 = 1000;
pub const MIN_IMAGE_NUM: u32 = 1;
pub const MAX_IMAGE_NUM: u32 = 3;
pub const MAX_RETRIES_CEILING: u32 = 10;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_OUTPUT: &str = "all.png";

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub image_num: u32,
    pub buffer_size: usize,
    pub num_producers: usize,
    pub num_consumers: usize,
    pub consumer_delay_ms: u64,
    pub max_retries: u32,
    pub output: String,
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::Configuration("endpoint must not be empty".into()));
        }
        if !(MIN_IMAGE_NUM..=MAX_IMAGE_NUM).contains(&self.image_num) {
            return Err(Error::Configuration(format!(
                "image_num {} out of range [{MIN_IMAGE_NUM}, {MAX_IMAGE_NUM}]",
                self.image_num
            )));
        }
        if !(MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&self.buffer_size) {
            return Err(Error::Configuration(format!(
                "buffer_size {} out of range [{MIN_BUFFER_SIZE}, {MAX_BUFFER_SIZE}]",
                self.buffer_size
            )));
        }
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&self.num_producers) {
            return Err(Error::Configuration(format!(
                "num_producers {} out of range [{MIN_WORKERS}, {MAX_WORKERS}]",
                self.num_producers
            )));
        }
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&self.num_consumers) {
            return Err(Error::Configuration(format!(
                "num_consumers {} out of range [{MIN_WORKERS}, {MAX_WORKERS}]",
                self.num_consumers
            )));
        }
        if self.consumer_delay_ms > MAX_CONSUMER_DELAY_MS {
            return Err(Error::Configuration(format!(
                "consumer_delay_ms {} exceeds maximum {MAX_CONSUMER_DELAY_MS}",
                self.consumer_delay_ms
            )));
        }
        if self.max_retries > MAX_RETRIES_CEILING {
            return Err(Error::Configuration(format!(
                "max_retries {} exceeds maximum {MAX_RETRIES_CEILING}",
                self.max_retries
            )));
        }
        if self.output.trim().is_empty() {
            return Err(Error::Configuration("output path must not be empty".into()));
        }
        Ok(())
    }

    pub fn consumer_delay(&self) -> Duration {
        Duration::from_millis(self.consumer_delay_ms)
    }
}
