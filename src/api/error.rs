use thiserror::Error;

use super::Operation;

#[derive(Debug, Error)]
pub enum Error {
    #[error("bad request (400)")]
    BadRequest,
    #[error("unauthorized (401), username or password incorrect or missing")]
    Unauthorized,
    #[error("forbidden (403)")]
    Forbidden,
    #[error("forbidden (403), the session doesn't exist anymore")]
    SessionExpired,
    #[error("forbidden (403), the session was already closed")]
    AlreadyClosed,
    #[error("internal server error (500){}", missing_suffix(.session_missing))]
    ServerError { session_missing: bool },
    #[error("service unavailable (503)")]
    ServiceUnavailable,
    #[error("bad gateway (502), server is probably unavailable")]
    BadGateway,
    #[error("unexpected response status {0}")]
    UnexpectedStatus(u16),
    #[error("couldn't connect: {0}")]
    ConnectionFailure(#[source] reqwest::Error),
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("http transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("couldn't parse {operation} response: {source}")]
    Decode {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },
}
pub type Result<T> = std::result::Result<T, Error>;

fn missing_suffix(session_missing: &bool) -> &'static str {
    if *session_missing {
        ", the session doesn't exist"
    } else {
        ""
    }
}

impl Error {
    /// Sort a transport error into connection failure, timeout or anything else.
    ///
    /// A connect that times out counts as a connection failure, only a
    /// request that stalls after connecting is a [`Error::Timeout`].
    pub(crate) fn from_transport(err: reqwest::Error) -> Error {
        if err.is_connect() {
            Error::ConnectionFailure(err)
        } else if err.is_timeout() {
            Error::Timeout(err)
        } else {
            Error::Transport(err)
        }
    }

    /// The status code the server answered with, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::BadRequest => Some(400),
            Error::Unauthorized => Some(401),
            Error::Forbidden | Error::SessionExpired | Error::AlreadyClosed => Some(403),
            Error::ServerError { .. } => Some(500),
            Error::ServiceUnavailable => Some(503),
            Error::BadGateway => Some(502),
            Error::UnexpectedStatus(code) => Some(*code),
            Error::ConnectionFailure(_)
            | Error::Timeout(_)
            | Error::Transport(_)
            | Error::Decode { .. } => None,
        }
    }

    /// The session this error was returned for can't be used anymore and
    /// the caller has to authenticate again.
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            Error::SessionExpired
                | Error::AlreadyClosed
                | Error::ServerError {
                    session_missing: true
                }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn ends_session() {
        assert!(Error::SessionExpired.ends_session());
        assert!(Error::AlreadyClosed.ends_session());
        assert!(Error::ServerError {
            session_missing: true
        }
        .ends_session());

        assert!(!Error::Forbidden.ends_session());
        assert!(!Error::ServiceUnavailable.ends_session());
        assert!(!Error::ServerError {
            session_missing: false
        }
        .ends_session());
    }

    #[test]
    fn display() {
        assert_eq!(
            Error::ServerError {
                session_missing: true
            }
            .to_string(),
            "internal server error (500), the session doesn't exist"
        );
        assert_eq!(
            Error::ServerError {
                session_missing: false
            }
            .to_string(),
            "internal server error (500)"
        );
        assert_eq!(Error::UnexpectedStatus(418).status(), Some(418));
        assert_eq!(Error::AlreadyClosed.status(), Some(403));
    }
}
