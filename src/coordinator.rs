//
// fragcat - coordinator.rs - sequence assignment and the retry ledger
//
// Resolves the one real design gap in the brief: what happens to a sequence
// whose fetch keeps failing. Rather than retry forever (a producer could
// spin on one flaky sequence past the point it matters) or give up after
// one failure (too eager given the fetch is known to be flaky), each
// sequence gets up to `max_retries` attempts before it's written off to
// `missing` and the run proceeds without it.
//

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

struct State {
    next_sequence: i32,
    retry_queue: VecDeque<i32>,
    attempts: HashMap<i32, u32>,
    consumed: HashSet<i32>,
    missing: Vec<i32>,
}

/// Hands out fragment sequence numbers to producer threads and tracks which
/// have been consumed, retried, or permanently abandoned.
///
/// All bookkeeping lives behind one `Mutex`; calls are infrequent relative to
/// the network I/O and decompression they bracket, so contention here is
/// never the bottleneck.
pub struct WorkCoordinator {
    total: i32,
    max_retries: u32,
    state: Mutex<State>,
}

impl WorkCoordinator {
    pub fn new(total: i32, max_retries: u32) -> WorkCoordinator {
        WorkCoordinator {
            total,
            max_retries,
            state: Mutex::new(State {
                next_sequence: 0,
                retry_queue: VecDeque::new(),
                attempts: HashMap::new(),
                consumed: HashSet::new(),
                missing: Vec::new(),
            }),
        }
    }

    /// Returns the next sequence a producer should fetch, preferring retries
    /// over fresh work so a flaky sequence doesn't get crowded out forever.
    /// `None` means there's nothing left to claim right now.
    pub fn claim(&self) -> Option<i32> {
        let mut state = self.state.lock().unwrap();
        if let Some(seq) = state.retry_queue.pop_front() {
            return Some(seq);
        }
        if state.next_sequence < self.total {
            let seq = state.next_sequence;
            state.next_sequence += 1;
            return Some(seq);
        }
        None
    }

    /// Records a failed fetch/decode for `sequence`. Re-queues it for another
    /// attempt if it hasn't exhausted `max_retries`, otherwise abandons it.
    pub fn report_failure(&self, sequence: i32) {
        let mut state = self.state.lock().unwrap();
        let attempts = state.attempts.entry(sequence).or_insert(0);
        *attempts += 1;
        if *attempts <= self.max_retries {
            state.retry_queue.push_back(sequence);
        } else {
            state.missing.push(sequence);
        }
    }

    /// Records that `sequence` was successfully applied to the raster.
    pub fn mark_consumed(&self, sequence: i32) {
        self.state.lock().unwrap().consumed.insert(sequence);
    }

    /// True once every sequence has either been consumed or abandoned.
    pub fn is_complete(&self) -> bool {
        let state = self.state.lock().unwrap();
        (state.consumed.len() + state.missing.len()) as i32 >= self.total
    }

    /// Sequences abandoned after exhausting their retry budget, ascending.
    pub fn missing(&self) -> Vec<i32> {
        let mut missing = self.state.lock().unwrap().missing.clone();
        missing.sort_unstable();
        missing
    }

    pub fn consumed_count(&self) -> usize {
        self.state.lock().unwrap().consumed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_sequences_in_order_until_exhausted() {
        let coord = WorkCoordinator::new(3, 2);
        assert_eq!(coord.claim(), Some(0));
        assert_eq!(coord.claim(), Some(1));
        assert_eq!(coord.claim(), Some(2));
        assert_eq!(coord.claim(), None);
    }

    #[test]
    fn failed_fetch_is_retried_up_to_the_limit() {
        let coord = WorkCoordinator::new(1, 2);
        assert_eq!(coord.claim(), Some(0));
        coord.report_failure(0); // attempt 1, retry
        assert_eq!(coord.claim(), Some(0));
        coord.report_failure(0); // attempt 2, retry
        assert_eq!(coord.claim(), Some(0));
        coord.report_failure(0); // attempt 3, exceeds max_retries(2), abandoned
        assert_eq!(coord.claim(), None);
        assert_eq!(coord.missing(), vec![0]);
    }

    #[test]
    fn consumed_and_missing_together_signal_completion() {
        let coord = WorkCoordinator::new(2, 0);
        assert_eq!(coord.claim(), Some(0));
        assert_eq!(coord.claim(), Some(1));
        coord.mark_consumed(0);
        assert!(!coord.is_complete());
        coord.report_failure(1); // max_retries 0, abandoned on first failure
        assert!(coord.is_complete());
        assert_eq!(coord.missing(), vec![1]);
    }

    #[test]
    fn retries_take_priority_over_fresh_sequences() {
        let coord = WorkCoordinator::new(5, 3);
        assert_eq!(coord.claim(), Some(0));
        coord.report_failure(0);
        // Sequence 0 should come back before sequence 1 is handed out.
        assert_eq!(coord.claim(), Some(0));
    }
}
