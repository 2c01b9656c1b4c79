//! Error types for stmo-client.

use thiserror::Error;

/// A remote call that did not produce what we asked for.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The id cannot name a query on the service; nothing was sent.
    #[error("'{0}' is not a valid query id; ids are numeric")]
    InvalidId(String),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never got an answer (DNS, TLS, connection reset, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered 2xx with a body we could not make sense of.
    #[error("unexpected response from service: {0}")]
    Decode(String),

    /// The results endpoint has nothing cached for this query text. The
    /// service may have started a run of the query; results show up once it
    /// finishes.
    #[error("no cached results available; the query may be running on the service, try again later")]
    NoCachedResults,
}

impl ServiceError {
    /// HTTP status code, when the service produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<ureq::Error> for ServiceError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => ServiceError::Status {
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => ServiceError::Transport(transport.to_string()),
        }
    }
}
