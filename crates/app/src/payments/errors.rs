//! Payment processor errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentProcessorError {
    /// The processor could not be reached or the connection failed mid-request.
    #[error("could not reach payment processor")]
    Transport(#[source] reqwest::Error),

    #[error("payment processor rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected response from payment processor")]
    Decode(#[source] reqwest::Error),
}

impl PaymentProcessorError {
    /// Whether retrying the same request might succeed.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
