//! Long-running operation watcher.
//!
//! A video job is submitted once and then re-fetched at a fixed interval until
//! the service reports it done. Status checks are strictly sequential: the
//! next one is only issued after the previous one returned. A failed status
//! check ends the wait immediately.
//!
//! Unlike a bare `while !done` loop, the wait is bounded by a [`PollPolicy`];
//! use [`PollPolicy::unbounded`] to poll forever.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::media::{MediaStore, PlayableVideo};
use crate::providers::GenerationService;
use crate::providers::gemini::RemoteOperation;

/// Default spacing between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default cap on status checks (about ten minutes at the default interval).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 120;

const DEFAULT_VIDEO_MIME_TYPE: &str = "video/mp4";

/// How long to keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait between status checks.
    pub interval: Duration,
    /// Give up after this many status checks.
    pub max_attempts: Option<u32>,
    /// Give up once this much time has passed since polling started.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            deadline: None,
        }
    }
}

impl PollPolicy {
    /// Poll at the default interval with no limit at all.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
            deadline: None,
        }
    }

    /// Set the interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the attempt cap.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the wall-clock deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    fn exhausted(&self, attempts: u32, elapsed: Duration) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
            || self.deadline.is_some_and(|d| elapsed + self.interval > d)
    }
}

/// Observable state of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Still running.
    Pending,
    /// Reached a terminal state.
    Done,
}

impl PollState {
    /// The state an operation is in.
    #[must_use]
    pub const fn of(operation: &RemoteOperation) -> Self {
        if operation.done {
            Self::Done
        } else {
            Self::Pending
        }
    }
}

/// Watches one operation on one service.
#[derive(Debug)]
pub struct OperationPoller<'a, S> {
    service: &'a S,
    policy: PollPolicy,
}

impl<'a, S: GenerationService> OperationPoller<'a, S> {
    /// Create a poller.
    #[must_use]
    pub const fn new(service: &'a S, policy: PollPolicy) -> Self {
        Self { service, policy }
    }

    /// Poll until the operation is done.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PollTimeout`] when the policy runs out, or the error
    /// of a failed status check.
    #[instrument(skip(self, operation), fields(operation = %operation.name))]
    pub async fn wait(&self, operation: RemoteOperation) -> Result<RemoteOperation> {
        let started = Instant::now();
        let mut attempts = 0u32;
        let mut operation = operation;

        while PollState::of(&operation) == PollState::Pending {
            if self.policy.exhausted(attempts, started.elapsed()) {
                warn!(attempts, "operation still pending, giving up");
                return Err(Error::PollTimeout {
                    name: operation.name,
                    attempts,
                    elapsed: started.elapsed(),
                });
            }

            sleep(self.policy.interval).await;
            attempts += 1;
            operation = self.service.get_operation(&operation.name).await?;
            debug!(attempt = attempts, done = operation.done, "status checked");
        }

        info!(
            attempts,
            elapsed_secs = started.elapsed().as_secs(),
            "operation finished"
        );
        Ok(operation)
    }

    /// Wait for the operation, download its video and register it in `media`.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`wait`](Self::wait):
    /// - [`Error::GenerationRequest`] if the job finished with an error
    /// - [`Error::EmptyResult`] if it finished without a video
    /// - [`Error::ArtifactFetch`] if the download failed
    pub async fn resolve(
        &self,
        operation: RemoteOperation,
        media: &MediaStore,
    ) -> Result<PlayableVideo> {
        let mut operation = self.wait(operation).await?;

        if let Some(error) = operation.error.take() {
            return Err(Error::operation_failed(error.code, error.message));
        }

        let uri = operation
            .video_uri()
            .ok_or_else(|| Error::empty("video", operation.filtered_reasons()))?;

        let artifact = self.service.fetch_artifact(uri).await?;
        let mime_type = artifact
            .mime_type
            .filter(|m| m.starts_with("video/"))
            .unwrap_or_else(|| DEFAULT_VIDEO_MIME_TYPE.to_string());
        let size = artifact.bytes.len();
        let url = media.create(artifact.bytes, mime_type.clone()).await;

        Ok(PlayableVideo {
            url,
            mime_type,
            size,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::providers::gemini::OperationError;
    use crate::providers::mock::{MockCall, MockService, video_artifact};

    const URI: &str = "https://files.example/v1/video:download?alt=media";

    #[tokio::test(start_paused = true)]
    async fn test_pending_pending_done_then_one_download() {
        let service = MockService::new();
        service.push_operation(Ok(RemoteOperation::pending("operations/veo")));
        service.push_operation(Ok(RemoteOperation::pending("operations/veo")));
        service.push_operation(Ok(RemoteOperation::completed("operations/veo", URI)));
        service.push_artifact(Ok(video_artifact(b"\x00\x00\x00\x18ftypmp42")));

        let media = MediaStore::new();
        let started = Instant::now();
        let poller = OperationPoller::new(&service, PollPolicy::default());
        let video = poller
            .resolve(RemoteOperation::pending("operations/veo"), &media)
            .await
            .unwrap();

        let calls = service.timed_calls();
        assert_eq!(calls.len(), 4);
        let status_times: Vec<Instant> = calls
            .iter()
            .filter(|(_, c)| matches!(c, MockCall::GetOperation { .. }))
            .map(|(t, _)| *t)
            .collect();
        assert_eq!(status_times.len(), 3);
        assert!(status_times[0] - started >= DEFAULT_POLL_INTERVAL);
        for pair in status_times.windows(2) {
            assert!(pair[1] - pair[0] >= DEFAULT_POLL_INTERVAL);
        }
        assert_eq!(
            calls[3].1,
            MockCall::FetchArtifact {
                uri: URI.to_string()
            }
        );

        assert_eq!(video.mime_type, "video/mp4");
        assert_eq!(video.size, 12);
        assert!(media.get(&video.url).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_done_skips_polling() {
        let service = MockService::new();
        let poller = OperationPoller::new(&service, PollPolicy::default());

        let op = poller
            .wait(RemoteOperation::completed("operations/done", URI))
            .await
            .unwrap();
        assert!(op.done);
        assert!(service.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_attempts_times_out() {
        let service = MockService::new();
        for _ in 0..3 {
            service.push_operation(Ok(RemoteOperation::pending("operations/slow")));
        }
        let policy = PollPolicy::default().with_max_attempts(Some(2));
        let poller = OperationPoller::new(&service, policy);

        let err = poller
            .wait(RemoteOperation::pending("operations/slow"))
            .await
            .unwrap_err();
        match err {
            Error::PollTimeout { name, attempts, .. } => {
                assert_eq!(name, "operations/slow");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(service.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_times_out() {
        let service = MockService::new();
        for _ in 0..10 {
            service.push_operation(Ok(RemoteOperation::pending("operations/slow")));
        }
        let policy = PollPolicy::unbounded().with_deadline(Some(Duration::from_secs(12)));
        let poller = OperationPoller::new(&service, policy);

        let err = poller
            .wait(RemoteOperation::pending("operations/slow"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PollTimeout { attempts: 2, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_failure_propagates_immediately() {
        let service = MockService::new();
        service.push_operation(Err(Error::request(Some(503), "backend unavailable")));
        service.push_operation(Ok(RemoteOperation::completed("operations/x", URI)));
        let poller = OperationPoller::new(&service, PollPolicy::default());

        let err = poller
            .wait(RemoteOperation::pending("operations/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::GenerationRequest { status: Some(503), .. }));
        assert_eq!(service.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_without_uri_is_empty_result() {
        let service = MockService::new();
        let done = RemoteOperation {
            name: "operations/empty".into(),
            done: true,
            ..RemoteOperation::default()
        };
        let poller = OperationPoller::new(&service, PollPolicy::default());

        let err = poller.resolve(done, &MediaStore::new()).await.unwrap_err();
        assert!(matches!(err, Error::EmptyResult { what: "video", .. }));
        assert!(service.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_with_error_is_request_error() {
        let service = MockService::new();
        let failed = RemoteOperation {
            name: "operations/failed".into(),
            done: true,
            error: Some(OperationError {
                code: Some(3),
                message: "unsupported image".into(),
            }),
            response: None,
        };
        let poller = OperationPoller::new(&service, PollPolicy::default());

        let err = poller.resolve(failed, &MediaStore::new()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "generation request rejected (code 3): unsupported image"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_failure_registers_nothing() {
        let service = MockService::new();
        service.push_artifact(Err(Error::artifact("HTTP 403 Forbidden")));
        let media = MediaStore::new();
        let poller = OperationPoller::new(&service, PollPolicy::default());

        let err = poller
            .resolve(RemoteOperation::completed("operations/y", URI), &media)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ArtifactFetch(_)));
        assert!(media.is_empty().await);
    }
}
