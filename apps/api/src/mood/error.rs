use std::fmt;

use serde::Serialize;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification of a failed analysis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisErrorKind {
    Configuration,
    EmptyResponse,
    Malformed,
    Timeout,
    Connectivity,
    Authorization,
    Service,
}

impl AnalysisErrorKind {
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            AnalysisErrorKind::Configuration | AnalysisErrorKind::Authorization
        )
    }
}

impl fmt::Display for AnalysisErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnalysisErrorKind::Configuration => "configuration",
            AnalysisErrorKind::EmptyResponse => "empty_response",
            AnalysisErrorKind::Malformed => "malformed_response",
            AnalysisErrorKind::Timeout => "timeout",
            AnalysisErrorKind::Connectivity => "connectivity",
            AnalysisErrorKind::Authorization => "authorization",
            AnalysisErrorKind::Service => "service",
        };
        f.write_str(s)
    }
}

/// Error raised by the mood analyzer and the expression measurer.
///
/// Callers use `is_retryable()` to decide between re-queueing the analysis
/// and surfacing a permanent failure on the entry.
#[derive(Debug, Error)]
#[error("{kind} error: {message}")]
pub struct AnalysisError {
    kind: AnalysisErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
    retryable: bool,
}

impl AnalysisError {
    pub fn new(kind: AnalysisErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            retryable: kind.is_retryable(),
        }
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::Configuration, message)
    }

    pub fn empty_response(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::EmptyResponse, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::Malformed, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::Timeout, message)
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::Connectivity, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::Authorization, message)
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(AnalysisErrorKind::Service, message)
    }

    /// Classifies a non-success HTTP status from an external service.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => Self::authorization(message),
            408 | 504 => Self::timeout(message),
            _ => Self::service(message),
        }
    }

    /// Classifies a transport-level failure from `reqwest`.
    pub fn from_transport(err: reqwest::Error) -> Self {
        let base = if err.is_timeout() {
            Self::timeout("request to external service timed out")
        } else if err.is_connect() || err.is_request() {
            Self::connectivity("could not reach external service")
        } else if err.is_decode() || err.is_body() {
            Self::malformed("could not decode response from external service")
        } else {
            Self::service("external service request failed")
        };
        base.with_source(err)
    }

    pub fn kind(&self) -> AnalysisErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}
