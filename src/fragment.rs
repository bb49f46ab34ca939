//
// fragcat - fragment.rs - one fetched strip, framed for the bounded queue
//

/// Largest response body a fetch is willing to retain for one fragment.
/// Sized comfortably above any real strip PNG; a body larger than this is a
/// transport error rather than silently truncated.
pub const MAX_STRIP_SIZE: usize = 10_000;

/// One fetched-but-not-yet-consumed strip. `sequence` is the fragment's
/// position in final row order (`0..num_strips`), independent of the order
/// fetches complete in - that's the whole point of the work coordinator.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub sequence: i32,
    pub body: Vec<u8>,
}

impl Fragment {
    pub fn new(sequence: i32, body: Vec<u8>) -> Fragment {
        Fragment { sequence, body }
    }
}
