//! Per-archive retrieval with retry classification.
//!
//! [`ArchiveFetcher`] wraps one HTTP GET per archive in the retry policy
//! from [`RetryConfig`](crate::RetryConfig). Outcomes are classified into
//! [`FetchError`] kinds so the merger can tell "nothing published for this
//! day" (404) apart from genuine failures.

use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::http::{HttpClient, HttpRequest};
use crate::resolver::FileIdentifier;
use crate::retry::RetryConfig;
use crate::throttle::RequestPacer;

/// Archive-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Network,
    NotFound,
    RateLimited,
    SchemaMismatch,
    Cancelled,
    Internal,
}

/// Structured fetch error attached to one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
    retryable: bool,
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Network,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rejected(status: u16) -> Self {
        Self {
            kind: FetchErrorKind::Network,
            message: format!("archive host rejected the request (status {status})"),
            retryable: false,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::NotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::SchemaMismatch,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            kind: FetchErrorKind::Cancelled,
            message: String::from("download cancelled before this archive completed"),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FetchErrorKind::Network => "fetch.network",
            FetchErrorKind::NotFound => "fetch.not_found",
            FetchErrorKind::RateLimited => "fetch.rate_limited",
            FetchErrorKind::SchemaMismatch => "fetch.schema_mismatch",
            FetchErrorKind::Cancelled => "fetch.cancelled",
            FetchErrorKind::Internal => "fetch.internal",
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for FetchError {}

/// One archive that did not contribute rows, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFailure {
    pub identifier: FileIdentifier,
    pub error: FetchError,
}

impl ArchiveFailure {
    pub fn new(identifier: FileIdentifier, error: FetchError) -> Self {
        Self { identifier, error }
    }
}

impl Display for ArchiveFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.identifier.remote_path, self.error)
    }
}

/// Cooperative cancellation flag shared across in-flight archive tasks.
///
/// Cancellation is observed between attempts and between archives; an HTTP
/// attempt already on the wire is allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Downloads one archive at a time, applying pacing, retry, and status
/// classification.
pub struct ArchiveFetcher {
    client: Arc<dyn HttpClient>,
    retry: RetryConfig,
    pacer: Option<Arc<RequestPacer>>,
}

impl ArchiveFetcher {
    pub fn new(client: Arc<dyn HttpClient>, retry: RetryConfig) -> Self {
        Self {
            client,
            retry,
            pacer: None,
        }
    }

    /// Share a pacer across fetchers so the whole run observes one quota.
    pub fn with_pacer(mut self, pacer: Arc<RequestPacer>) -> Self {
        self.pacer = Some(pacer);
        self
    }

    pub const fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Fetch the raw bytes of one archive.
    ///
    /// Retries transient statuses and transport errors on the regular
    /// backoff ladder, 429 on the slower rate-limit ladder. A 404 is
    /// returned immediately as [`FetchErrorKind::NotFound`]; other
    /// non-transient statuses fail without retry.
    pub async fn fetch(
        &self,
        identifier: &FileIdentifier,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>, FetchError> {
        let mut last_error: Option<FetchError> = None;

        for attempt in 0..self.retry.max_attempts() {
            if cancel.is_cancelled() {
                return Err(FetchError::cancelled());
            }

            if attempt > 0 {
                let delay = match last_error.as_ref().map(FetchError::kind) {
                    Some(FetchErrorKind::RateLimited) => {
                        self.retry.rate_limit_delay_for_attempt(attempt - 1)
                    }
                    _ => self.retry.delay_for_attempt(attempt - 1),
                };
                tracing::warn!(
                    url = %identifier.remote_path,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying archive fetch"
                );
                tokio::time::sleep(delay).await;

                if cancel.is_cancelled() {
                    return Err(FetchError::cancelled());
                }
            }

            if let Some(pacer) = &self.pacer {
                pacer.until_ready().await;
            }

            let request = HttpRequest::get(identifier.remote_path.clone())
                .with_timeout_ms(self.retry.timeout_ms);

            match self.client.execute(request).await {
                Ok(response) if response.is_success() => {
                    tracing::debug!(
                        url = %identifier.remote_path,
                        bytes = response.body.len(),
                        "archive downloaded"
                    );
                    return Ok(response.body);
                }
                Ok(response) if response.status == 404 => {
                    return Err(FetchError::not_found(format!(
                        "no archive published at {}",
                        identifier.remote_path
                    )));
                }
                Ok(response) if response.status == 429 => {
                    last_error = Some(FetchError::rate_limited(
                        "throttled by the archive host (status 429)",
                    ));
                }
                Ok(response) if self.retry.should_retry_status(response.status) => {
                    last_error = Some(FetchError::network(format!(
                        "transient status {} from the archive host",
                        response.status
                    )));
                }
                Ok(response) => {
                    return Err(FetchError::rejected(response.status));
                }
                Err(error) if error.retryable() => {
                    last_error = Some(FetchError::network(error.message().to_string()));
                }
                Err(error) => {
                    return Err(FetchError::internal(error.message().to_string()));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| FetchError::internal("archive fetch exhausted zero attempts")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==== Error classification ====

    #[test]
    fn kinds_carry_the_expected_retry_semantics() {
        assert!(FetchError::network("reset").retryable());
        assert!(FetchError::rate_limited("slow down").retryable());
        assert!(!FetchError::not_found("missing").retryable());
        assert!(!FetchError::schema_mismatch("columns moved").retryable());
        assert!(!FetchError::cancelled().retryable());
        assert!(!FetchError::internal("bug").retryable());
        assert!(!FetchError::rejected(403).retryable());
    }

    #[test]
    fn codes_are_stable_identifiers() {
        assert_eq!(FetchError::network("x").code(), "fetch.network");
        assert_eq!(FetchError::not_found("x").code(), "fetch.not_found");
        assert_eq!(FetchError::rate_limited("x").code(), "fetch.rate_limited");
        assert_eq!(
            FetchError::schema_mismatch("x").code(),
            "fetch.schema_mismatch"
        );
        assert_eq!(FetchError::cancelled().code(), "fetch.cancelled");
        assert_eq!(FetchError::internal("x").code(), "fetch.internal");
    }

    #[test]
    fn display_appends_the_code() {
        let error = FetchError::rate_limited("throttled");
        assert_eq!(error.to_string(), "throttled (fetch.rate_limited)");
    }

    // ==== Cancellation token ====

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());

        token.cancel();
        assert!(observer.is_cancelled());
    }
}
