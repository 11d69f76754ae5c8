use std::time::Duration;

/// Errors an adapter can hit while fetching and decoding one provider
/// response. Every variant is captured into a [`ProviderResult`] and
/// crosses the task boundary as data, never as a panic.
///
/// [`ProviderResult`]: crate::providers::ProviderResult
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Terminal outcome of a lookup that did not produce an address.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The first provider to answer reported a failure. The race ends on
    /// the first result either way; the slower provider is never consulted.
    #[error("{provider}: {source}")]
    Provider {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("no provider answered within {deadline:?}")]
    DeadlineExceeded { deadline: Duration },

    #[error("no providers configured")]
    NoProviders,
}

impl LookupError {
    /// Whether this outcome is the race deadline expiring, as opposed to a
    /// provider answering with a failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LookupError::DeadlineExceeded { .. })
    }
}
