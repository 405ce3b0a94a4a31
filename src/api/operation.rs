use std::fmt::Display;

use reqwest::StatusCode;

use super::Error;

/// Every request the client knows how to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET /api/rest/authenticate?version=1.0`
    Discover,
    /// `POST <publicUrl>`
    Register,
    /// `POST <publicUrl>/keepalive`
    Keepalive,
    /// `DELETE <publicUrl>`
    Logout,
    /// `GET /api/rest/1.0/logins`
    Logins,
    /// `GET /api/rest/1.0/users/{username}`
    UserDetails,
    /// `GET /api/rest/1.0/users/{username}/preferences`
    UserPreferences,
    /// `POST /api/rest/1.0/telephony/basicCall`
    PlaceCall,
    /// `POST /api/rest/1.0/telephony/basicCall/answer`
    AnswerCall,
    /// `POST /api/rest/1.0/telephony/basicCall/dropme`
    DropCall,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Discover => "discover",
            Operation::Register => "register",
            Operation::Keepalive => "keepalive",
            Operation::Logout => "logout",
            Operation::Logins => "logins",
            Operation::UserDetails => "user-details",
            Operation::UserPreferences => "user-preferences",
            Operation::PlaceCall => "place-call",
            Operation::AnswerCall => "answer-call",
            Operation::DropCall => "drop-call",
        }
    }

    /// The only status code that counts as success.
    pub fn success(&self) -> StatusCode {
        match self {
            Operation::Discover
            | Operation::Register
            | Operation::Logins
            | Operation::UserDetails
            | Operation::UserPreferences => StatusCode::OK,
            Operation::PlaceCall => StatusCode::CREATED,
            Operation::Keepalive
            | Operation::Logout
            | Operation::AnswerCall
            | Operation::DropCall => StatusCode::NO_CONTENT,
        }
    }

    /// Map a non-success status to an error.
    ///
    /// | operation   | status | error                                  |
    /// |-------------|--------|----------------------------------------|
    /// | `Discover`  | `502`  | [`Error::BadGateway`]                  |
    /// | `Keepalive` | `403`  | [`Error::SessionExpired`]              |
    /// | `Logout`    | `403`  | [`Error::AlreadyClosed`]               |
    /// | `Logout`    | `500`  | [`Error::ServerError`], session missing |
    /// | `DropCall`  | `500`  | [`Error::ServerError`], session missing |
    ///
    /// Everything else goes through [`status_error`].
    pub fn classify(&self, status: StatusCode) -> Error {
        match (self, status.as_u16()) {
            (Operation::Discover, 502) => Error::BadGateway,
            (Operation::Keepalive, 403) => Error::SessionExpired,
            (Operation::Logout, 403) => Error::AlreadyClosed,
            (Operation::Logout | Operation::DropCall, 500) => Error::ServerError {
                session_missing: true,
            },
            _ => status_error(status),
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Status mapping shared by all operations.
pub fn status_error(status: StatusCode) -> Error {
    match status.as_u16() {
        400 => Error::BadRequest,
        401 => Error::Unauthorized,
        403 => Error::Forbidden,
        500 => Error::ServerError {
            session_missing: false,
        },
        503 => Error::ServiceUnavailable,
        code => Error::UnexpectedStatus(code),
    }
}
