//
// fragcat - concurrent fetch-decode-assemble pipeline for server-sharded PNG strips
//
// A fixed number of equal-height horizontal strips of one image are served
// one fragment at a time (each fragment itself a tiny PNG) by an HTTP
// endpoint, in no particular arrival order. This crate fetches every strip
// concurrently, decodes each one, places it at its known row offset in a
// shared raster, and re-encodes the assembled raster as one PNG.
//

pub mod chunk;
pub mod config;
pub mod coordinator;
pub mod crc32;
pub mod deflate;
pub mod error;
pub mod fetch;
pub mod fragment;
pub mod orchestrator;
pub mod png;
pub mod queue;
pub mod raster;
pub mod worker;

pub use config::Config;
pub use error::{Error, Result};
pub use orchestrator::RunReport;

/// Width, in pixels, of the final assembled image and of every strip.
pub const STRIP_WIDTH: u32 = 400;

/// Height, in pixels, of a single fetched strip.
pub const STRIP_HEIGHT: u32 = 6;

/// Samples per pixel; strips are always 8-bit RGBA.
pub const CHANNELS: u32 = 4;

/// Number of strips that make up one complete image.
pub const TOTAL_STRIPS: i32 = 50;
