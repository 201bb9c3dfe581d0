use thiserror::Error;

/// Errors raised while building or sending a generation request.
///
/// Configuration problems (missing key, no vision support, bad settings,
/// unreadable image) mean the request cannot be serviced and are reported to
/// the caller. Transport faults are absorbed by [`crate::resolver`] into a
/// fallback result.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The provider needs an API key and none was configured.
    #[error("{provider} API key is required. Set CAPTION_API_KEY or pass a key explicitly.")]
    MissingCredential { provider: String },

    /// An image was supplied but the configured model cannot see images.
    #[error("{provider} model '{model}' does not accept image input")]
    VisionUnsupported { provider: String, model: String },

    /// Settings could not be turned into a provider.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The provider answered with a non-success HTTP status.
    #[error("Provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The provider's body was not the JSON shape we expect.
    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("Failed to read image: {0}")]
    ImageRead(String),
}

impl GenerationError {
    /// True for errors that make the request unserviceable by design.
    ///
    /// These are surfaced to the caller instead of triggering fallback
    /// synthesis.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GenerationError::MissingCredential { .. }
                | GenerationError::VisionUnsupported { .. }
                | GenerationError::InvalidConfig(_)
                | GenerationError::ImageRead(_)
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, GenerationError>;
