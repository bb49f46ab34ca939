//
// fragcat - orchestrator.rs - wires config, coordinator, queue, raster and
// worker threads together into one run
//

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::coordinator::WorkCoordinator;
use crate::error::Error;
use crate::fetch::Fetcher;
use crate::fragment::Fragment;
use crate::png;
use crate::queue::BoundedQueue;
use crate::raster::Raster;
use crate::worker;
use crate::{CHANNELS, STRIP_HEIGHT, STRIP_WIDTH, TOTAL_STRIPS};

/// Summarizes one completed run: how long it took, which sequences (if any)
/// were abandoned after exhausting their retries, and where the image landed.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub elapsed: Duration,
    pub missing: Vec<i32>,
    pub output_path: String,
}

/// Runs one fetch/assemble pass: spawns `config.num_producers` producer
/// threads and `config.num_consumers` consumer threads around a shared
/// bounded queue, waits for them to finish, and writes the assembled image
/// to `config.output`.
///
/// Producers are joined before the queue is shut down, and the queue is
/// shut down before consumers are joined - that ordering is what lets a
/// consumer's blocking `get` return `None` once there's truly nothing left
/// to produce, instead of waiting forever.
pub fn run(config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<RunReport, Error> {
    config.validate()?;
    let started = Instant::now();

    let image_height = STRIP_HEIGHT * TOTAL_STRIPS as u32;
    let coordinator = Arc::new(WorkCoordinator::new(TOTAL_STRIPS, config.max_retries));
    let queue: Arc<BoundedQueue<Fragment>> = Arc::new(BoundedQueue::new(config.buffer_size));
    let raster = Arc::new(Raster::new(STRIP_WIDTH, image_height, CHANNELS));

    let producer_handles: Vec<_> = (0..config.num_producers)
        .map(|id| {
            let coordinator = Arc::clone(&coordinator);
            let queue = Arc::clone(&queue);
            let fetcher = Arc::clone(&fetcher);
            let image_num = config.image_num;
            thread::spawn(move || worker::producer_loop(id, image_num, &coordinator, fetcher.as_ref(), &queue))
        })
        .collect();

    let consumer_handles: Vec<_> = (0..config.num_consumers)
        .map(|id| {
            let coordinator = Arc::clone(&coordinator);
            let queue = Arc::clone(&queue);
            let raster = Arc::clone(&raster);
            let delay = config.consumer_delay();
            thread::spawn(move || worker::consumer_loop(id, STRIP_HEIGHT, delay, &coordinator, &queue, &raster))
        })
        .collect();

    for handle in producer_handles {
        handle.join().map_err(|_| Error::Resource("a producer thread panicked".into()))?;
    }
    queue.shutdown();
    for handle in consumer_handles {
        handle.join().map_err(|_| Error::Resource("a consumer thread panicked".into()))?;
    }

    let missing = coordinator.missing();
    if missing.is_empty() {
        log::info!("assembled all {TOTAL_STRIPS} fragments");
    } else {
        log::warn!("{} of {TOTAL_STRIPS} fragment(s) never decoded: {:?}", missing.len(), missing);
    }

    let raster =
        Arc::try_unwrap(raster).map_err(|_| Error::Resource("raster still shared after workers joined".into()))?;
    let raw = raster.into_bytes();

    let ihdr = png::IhdrData {
        width: STRIP_WIDTH,
        height: image_height,
        bit_depth: 8,
        color_type: png::color_type::TRUECOLOR_ALPHA,
        compression: 0,
        filter: 0,
        interlace: 0,
    };
    let assembled = png::deflate_into_png(ihdr, &raw, 6);
    let mut file = std::fs::File::create(&config.output)?;
    png::write_png(&mut file, &assembled)?;

    Ok(RunReport { elapsed: started.elapsed(), missing, output_path: config.output.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockFetcher;

    fn strip_png(fill: u8) -> Vec<u8> {
        let ihdr = png::IhdrData {
            width: STRIP_WIDTH,
            height: STRIP_HEIGHT,
            bit_depth: 8,
            color_type: png::color_type::TRUECOLOR_ALPHA,
            compression: 0,
            filter: 0,
            interlace: 0,
        };
        let stride = crate::raster::stride(STRIP_WIDTH, CHANNELS);
        let raw = vec![fill; stride * STRIP_HEIGHT as usize];
        let png = png::deflate_into_png(ihdr, &raw, 6);
        let mut out = Vec::new();
        png::write_png(&mut out, &png).unwrap();
        out
    }

    #[test]
    fn assembles_every_strip_into_one_png_on_disk() {
        let dir = std::env::temp_dir().join("fragcat_orchestrator_full_test");
        std::fs::create_dir_all(&dir).unwrap();
        let output = dir.join("assembled_full.png");

        let mut fetcher = MockFetcher::new();
        for seq in 0..TOTAL_STRIPS {
            fetcher = fetcher.with_body(seq, strip_png((seq % 256) as u8));
        }

        let config = Config {
            endpoint: "unused://mock".into(),
            image_num: 1,
            buffer_size: 4,
            num_producers: 3,
            num_consumers: 3,
            consumer_delay_ms: 0,
            max_retries: 2,
            output: output.to_string_lossy().into_owned(),
        };

        let report = run(&config, Arc::new(fetcher)).unwrap();
        assert!(report.missing.is_empty());

        let bytes = std::fs::read(&output).unwrap();
        let parsed = png::parse_png(&bytes).unwrap();
        assert_eq!(parsed.ihdr.width, STRIP_WIDTH);
        assert_eq!(parsed.ihdr.height, STRIP_HEIGHT * TOTAL_STRIPS as u32);

        std::fs::remove_file(&output).ok();
    }

    #[test]
    fn a_permanently_failing_fragment_is_reported_missing_but_the_run_still_finishes() {
        let dir = std::env::temp_dir().join("fragcat_orchestrator_missing_test");
        std::fs::create_dir_all(&dir).unwrap();
        let output = dir.join("assembled_missing.png");

        let mut fetcher = MockFetcher::new();
        for seq in 0..TOTAL_STRIPS {
            if seq != 7 {
                fetcher = fetcher.with_body(seq, strip_png(1));
            }
        }

        let config = Config {
            endpoint: "unused://mock".into(),
            image_num: 1,
            buffer_size: 4,
            num_producers: 2,
            num_consumers: 2,
            consumer_delay_ms: 0,
            max_retries: 1,
            output: output.to_string_lossy().into_owned(),
        };

        let report = run(&config, Arc::new(fetcher)).unwrap();
        assert_eq!(report.missing, vec![7]);
        assert!(std::path::Path::new(&output).exists());

        std::fs::remove_file(&output).ok();
    }

    #[test]
    fn invalid_config_is_rejected_before_any_threads_spawn() {
        let config = Config {
            endpoint: "unused://mock".into(),
            image_num: 99,
            buffer_size: 4,
            num_producers: 2,
            num_consumers: 2,
            consumer_delay_ms: 0,
            max_retries: 1,
            output: "ignored.png".into(),
        };
        let err = run(&config, Arc::new(MockFetcher::new())).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
