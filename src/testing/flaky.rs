//! Failure injection around another extractor.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::detection::{FrameExtractor, LumaFrame};

/// Wraps an extractor and fails every `fail_every`-th frame request.
///
/// `fail_every == 0` never fails and `1` fails every request. Requests are
/// counted in the order they reach the extractor, so the number of failures
/// out of `n` requests is always `n / fail_every`.
pub struct FlakyExtractor {
    inner: Arc<dyn FrameExtractor>,
    fail_every: usize,
    fail_probe: bool,
    requests: AtomicUsize,
    failures: AtomicUsize,
}

impl FlakyExtractor {
    pub fn new(inner: Arc<dyn FrameExtractor>, fail_every: usize) -> Self {
        Self {
            inner,
            fail_every,
            fail_probe: false,
            requests: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    /// Also fail duration probes.
    pub fn with_failing_probe(mut self) -> Self {
        self.fail_probe = true;
        self
    }

    /// Frame requests injected with a failure so far
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameExtractor for FlakyExtractor {
    async fn probe_duration_ms(&self, uri: &str) -> Result<u64> {
        if self.fail_probe {
            bail!("injected probe failure for {}", uri);
        }
        self.inner.probe_duration_ms(uri).await
    }

    async fn extract_frame(&self, uri: &str, time_ms: f64) -> Result<LumaFrame> {
        let request = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_every > 0 && request % self.fail_every == 0 {
            self.failures.fetch_add(1, Ordering::SeqCst);
            bail!("injected failure at {:.0} ms (request {})", time_ms, request);
        }
        self.inner.extract_frame(uri, time_ms).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SyntheticSwing, SyntheticSwingExtractor};

    fn inner() -> Arc<dyn FrameExtractor> {
        Arc::new(SyntheticSwingExtractor::new(SyntheticSwing::new(
            20, 50, 60, 30.0, 3000,
        )))
    }

    #[tokio::test]
    async fn test_fails_every_third_request() {
        let flaky = FlakyExtractor::new(inner(), 3);
        let mut outcomes = Vec::new();
        for i in 0..6 {
            outcomes.push(flaky.extract_frame("clip", i as f64 * 100.0).await.is_ok());
        }
        assert_eq!(outcomes, vec![true, true, false, true, true, false]);
        assert_eq!(flaky.failures(), 2);
    }

    #[tokio::test]
    async fn test_zero_never_fails_and_probe_passes_through() {
        let flaky = FlakyExtractor::new(inner(), 0);
        assert_eq!(flaky.probe_duration_ms("clip").await.unwrap(), 3000);
        for i in 0..5 {
            assert!(flaky.extract_frame("clip", i as f64).await.is_ok());
        }

        let flaky = FlakyExtractor::new(inner(), 0).with_failing_probe();
        assert!(flaky.probe_duration_ms("clip").await.is_err());
    }
}
