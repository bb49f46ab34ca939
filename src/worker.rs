//
// fragcat - worker.rs - the producer and consumer thread bodies
//

use std::thread;
use std::time::Duration;

use crate::coordinator::WorkCoordinator;
use crate::fetch::Fetcher;
use crate::fragment::Fragment;
use crate::png;
use crate::queue::BoundedQueue;
use crate::raster::Raster;

/// Claims sequences from `coordinator` and fetches them until none remain.
/// A fetch failure is reported back to the coordinator rather than retried
/// in-place, so a flaky sequence doesn't monopolize this thread while other
/// sequences sit unclaimed.
///
/// Returns once [`WorkCoordinator::claim`] reports nothing left to do, or the
/// queue has been shut down out from under it (the run is winding down for
/// some other reason).
pub fn producer_loop(
    worker_id: usize,
    image_num: u32,
    coordinator: &WorkCoordinator,
    fetcher: &dyn Fetcher,
    queue: &BoundedQueue<Fragment>,
) {
    loop {
        let sequence = match coordinator.claim() {
            Some(seq) => seq,
            None => {
                log::debug!("producer {worker_id}: no more sequences to claim");
                return;
            }
        };

        match fetcher.fetch(image_num, sequence) {
            Ok(fragment) => {
                log::trace!("producer {worker_id}: fetched sequence {sequence} ({} bytes)", fragment.body.len());
                if !queue.put(fragment) {
                    log::debug!("producer {worker_id}: queue shut down while enqueueing sequence {sequence}");
                    return;
                }
            }
            Err(err) => {
                log::warn!("producer {worker_id}: fetch of sequence {sequence} failed: {err}");
                coordinator.report_failure(sequence);
            }
        }
    }
}

/// Pulls fragments off `queue`, decodes each one's PNG payload, and places
/// its scanlines into `raster` at the row implied by its sequence.
///
/// A fragment that fails to parse or inflate is reported back to the
/// coordinator as a failed attempt (the same path a failed fetch takes) so
/// it gets retried rather than silently dropped. `delay` simulates
/// consumer-side processing cost and is driven entirely by configuration;
/// production runs set it to zero.
pub fn consumer_loop(
    worker_id: usize,
    strip_height: u32,
    delay: Duration,
    coordinator: &WorkCoordinator,
    queue: &BoundedQueue<Fragment>,
    raster: &Raster,
) {
    loop {
        let fragment = match queue.get() {
            Some(fragment) => fragment,
            None => {
                log::debug!("consumer {worker_id}: queue drained and shut down");
                return;
            }
        };

        if !delay.is_zero() {
            thread::sleep(delay);
        }

        let sequence = fragment.sequence;
        match decode_strip(&fragment) {
            Ok(scanlines) => {
                let first_row = sequence as u32 * strip_height;
                match raster.place(first_row, strip_height, &scanlines) {
                    Ok(()) => {
                        coordinator.mark_consumed(sequence);
                        log::trace!("consumer {worker_id}: placed sequence {sequence} at row {first_row}");
                    }
                    Err(err) => {
                        log::warn!("consumer {worker_id}: sequence {sequence} failed to place: {err}");
                        coordinator.report_failure(sequence);
                    }
                }
            }
            Err(err) => {
                log::warn!("consumer {worker_id}: sequence {sequence} failed to decode: {err}");
                coordinator.report_failure(sequence);
            }
        }
    }
}

fn decode_strip(fragment: &Fragment) -> crate::error::Result<Vec<u8>> {
    let parsed = png::parse_png(&fragment.body)?;
    if let Some(mismatch) = &parsed.first_crc_mismatch {
        log::debug!(
            "sequence {}: CRC mismatch (expected {:#010x}, computed {:#010x}), continuing",
            fragment.sequence,
            mismatch.expected,
            mismatch.computed
        );
    }
    png::inflate_idat(&parsed.idat)
}
