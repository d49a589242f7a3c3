//! Error taxonomy for the relay pipeline
//!
//! Classification failures never show up here: the classifier recovers them
//! locally by falling back to the primary language.

use thiserror::Error;

/// Fixed apology shown to end users whenever a reply cannot be produced.
pub const APOLOGY_MESSAGE: &str =
    "Apologies, I encountered an error. Please try your request again. 🙏";

/// Generic error body returned by the HTTP surface.
pub const HTTP_FAILURE_MESSAGE: &str = "Failed to get response from AI";

#[derive(Debug, Error)]
pub enum RelayError {
    /// A required request field was absent or blank.
    #[error("{0}")]
    MissingInput(&'static str),

    /// The generative service failed, timed out or returned nothing.
    #[error("generation failed: {0}")]
    Generation(#[source] anyhow::Error),

    /// The history store could not be read or written.
    #[error("history persistence failed: {0}")]
    Persistence(#[source] anyhow::Error),

    /// The transport rejected an outbound message.
    #[error("delivery failed: {0}")]
    Delivery(#[source] anyhow::Error),
}

impl RelayError {
    /// Text that is safe to show to an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            RelayError::MissingInput(reason) => reason,
            _ => APOLOGY_MESSAGE,
        }
    }
}
