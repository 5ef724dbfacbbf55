// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrency and deadline gate for outbound model calls.
//!
//! Every chat and transcription call passes through a [`CallGate`], which
//! caps in-flight calls with a semaphore and bounds each call with a timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mockview_config::model::LimitsConfig;
use mockview_core::MockviewError;
use tokio::sync::Semaphore;
use tracing::warn;

/// Bounded-concurrency gate with a per-call deadline.
#[derive(Debug, Clone)]
pub struct CallGate {
    permits: Arc<Semaphore>,
    call_timeout: Duration,
}

impl CallGate {
    pub fn new(max_concurrent: usize, call_timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            call_timeout,
        }
    }

    pub fn from_config(limits: &LimitsConfig) -> Self {
        Self::new(
            limits.max_concurrent_calls,
            Duration::from_secs(limits.call_timeout_secs),
        )
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Runs `call` under a permit with the default deadline.
    pub async fn run<T, F>(&self, call: F) -> Result<T, MockviewError>
    where
        F: Future<Output = Result<T, MockviewError>>,
    {
        self.run_with_timeout(self.call_timeout, call).await
    }

    /// Runs `call` under a permit with an explicit deadline.
    ///
    /// The deadline starts once a permit is held. On expiry the call future
    /// is dropped and [`MockviewError::Timeout`] is returned.
    pub async fn run_with_timeout<T, F>(
        &self,
        deadline: Duration,
        call: F,
    ) -> Result<T, MockviewError>
    where
        F: Future<Output = Result<T, MockviewError>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| MockviewError::Internal("call gate is closed".into()))?;

        match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = deadline.as_millis() as u64, "model call timed out");
                Err(MockviewError::Timeout { duration: deadline })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn passes_through_result() {
        let gate = CallGate::new(2, Duration::from_secs(1));
        let value = gate.run(async { Ok::<_, MockviewError>(42) }).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(gate.available_permits(), 2);
    }

    #[tokio::test]
    async fn passes_through_error() {
        let gate = CallGate::new(1, Duration::from_secs(1));
        let err = gate
            .run(async { Err::<(), _>(MockviewError::provider("boom")) })
            .await
            .unwrap_err();
        assert!(matches!(err, MockviewError::Provider { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let gate = CallGate::new(1, Duration::from_millis(50));
        let err = gate
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, MockviewError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MockviewError::Timeout { duration } if duration == Duration::from_millis(50)));
        assert!(err.is_recoverable());
        // Permit is released after the timeout.
        assert_eq!(gate.available_permits(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn caps_concurrent_calls() {
        let gate = CallGate::new(2, Duration::from_secs(5));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let gate = gate.clone();
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                gate.run(async {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, MockviewError>(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }
}
