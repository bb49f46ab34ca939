//
// fragcat - fetch.rs - fetching one fragment over HTTP
//
// `Fetcher` is a trait so the worker loop never touches `reqwest` directly;
// tests drive the whole pipeline against an in-memory double instead of a
// real server.
//

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::Error;
use crate::fragment::{Fragment, MAX_STRIP_SIZE};

/// The server-side header a fragment response carries to confirm which part
/// it actually served, independent of which part the client asked for.
pub const FRAGMENT_HEADER: &str = "X-Ece252-Fragment";

pub trait Fetcher: Send + Sync {
    /// Fetches one fragment of `image_num` by its sequence number.
    fn fetch(&self, image_num: u32, sequence: i32) -> Result<Fragment, Error>;
}

/// Fetches fragments from a real HTTP endpoint with `reqwest::blocking`.
///
/// Blocking rather than async because the pipeline's concurrency unit is the
/// OS thread (see `worker.rs`); there's no event loop for `reqwest`'s async
/// client to share, so the blocking client is the simpler, equally capable
/// choice here.
pub struct ReqwestFetcher {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl ReqwestFetcher {
    pub fn new(endpoint: String, timeout: Duration) -> Result<ReqwestFetcher, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(ReqwestFetcher { client, endpoint })
    }
}

impl Fetcher for ReqwestFetcher {
    fn fetch(&self, image_num: u32, sequence: i32) -> Result<Fragment, Error> {
        let url = format!("{}?img={}&part={}", self.endpoint, image_num, sequence);
        let response = self.client.get(&url).send().map_err(|e| Error::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Transport(format!(
                "sequence {sequence}: server returned status {}",
                response.status()
            )));
        }

        if let Some(value) = response.headers().get(FRAGMENT_HEADER) {
            let reported: i32 = value
                .to_str()
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| Error::Transport(format!("sequence {sequence}: malformed {FRAGMENT_HEADER} header")))?;
            if reported != sequence {
                return Err(Error::Transport(format!(
                    "sequence {sequence}: server reported fragment {reported} instead"
                )));
            }
        }

        let body = response.bytes().map_err(|e| Error::Transport(e.to_string()))?;
        if body.len() > MAX_STRIP_SIZE {
            return Err(Error::Transport(format!(
                "sequence {sequence}: body of {} bytes exceeds the {MAX_STRIP_SIZE}-byte limit",
                body.len()
            )));
        }

        Ok(Fragment::new(sequence, body.to_vec()))
    }
}

/// An in-memory [`Fetcher`] for tests. Each sequence can be scripted to
/// succeed with given bytes, fail a fixed number of times before succeeding,
/// or fail forever (to exercise the coordinator's abandonment path).
#[derive(Default)]
pub struct MockFetcher {
    bodies: Mutex<HashMap<i32, Vec<u8>>>,
    fail_until_attempt: Mutex<HashMap<i32, u32>>,
    attempts: Mutex<HashMap<i32, u32>>,
}

impl MockFetcher {
    pub fn new() -> MockFetcher {
        MockFetcher::default()
    }

    pub fn with_body(self, sequence: i32, body: Vec<u8>) -> MockFetcher {
        self.bodies.lock().unwrap().insert(sequence, body);
        self
    }

    /// Makes `sequence` fail on its first `failures` attempts, then succeed.
    pub fn failing_first(self, sequence: i32, failures: u32) -> MockFetcher {
        self.fail_until_attempt.lock().unwrap().insert(sequence, failures);
        self
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, _image_num: u32, sequence: i32) -> Result<Fragment, Error> {
        let mut attempts = self.attempts.lock().unwrap();
        let attempt = attempts.entry(sequence).or_insert(0);
        *attempt += 1;

        let fail_until = self.fail_until_attempt.lock().unwrap().get(&sequence).copied().unwrap_or(0);
        if *attempt <= fail_until {
            return Err(Error::Transport(format!("mock failure #{attempt} for sequence {sequence}")));
        }

        match self.bodies.lock().unwrap().get(&sequence) {
            Some(body) => Ok(Fragment::new(sequence, body.clone())),
            None => Err(Error::Transport(format!("mock has no body scripted for sequence {sequence}"))),
        }
    }
}
