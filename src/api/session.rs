use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Used when the server doesn't announce a time to live.
const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Returned by the discovery step, tells us where to register the session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUrls {
    /// Reachable from the outside
    pub public_url: String,
    /// Used if `public_url` can't be connected to
    pub internal_url: String,
}

/// Returned by the server after registering a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(default)]
    pub admin: Option<bool>,
    /// Seconds without a keepalive until the server drops the session
    #[serde(default)]
    pub time_to_live: Option<u64>,
    #[serde(default)]
    pub public_base_url: Option<String>,
    #[serde(default)]
    pub private_base_url: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl SessionInfo {
    /// The server may answer the registration with an empty body.
    pub(crate) fn from_json(text: &str) -> serde_json::Result<SessionInfo> {
        if text.trim().is_empty() {
            return Ok(SessionInfo::default());
        }
        serde_json::from_str(text)
    }
}

/// An active session on the server.
///
/// Can only be obtained from [`Client::authenticate`](super::Client::authenticate),
/// which makes every session scoped call impossible without logging in first.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    urls: SessionUrls,
    info: SessionInfo,
}

impl Session {
    pub(crate) fn new(urls: SessionUrls, info: SessionInfo) -> Session {
        Session { urls, info }
    }

    pub fn public_url(&self) -> &str {
        &self.urls.public_url
    }

    pub fn internal_url(&self) -> &str {
        &self.urls.internal_url
    }

    pub fn urls(&self) -> &SessionUrls {
        &self.urls
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    /// Half the time to live, so a keepalive that's a bit late still makes it.
    pub fn keepalive_interval(&self) -> Duration {
        match self.info.time_to_live {
            Some(ttl) if ttl > 0 => Duration::from_secs((ttl / 2).max(1)),
            _ => DEFAULT_KEEPALIVE_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Session, SessionInfo, SessionUrls};

    fn urls() -> SessionUrls {
        SessionUrls {
            public_url: "https://ot.example.com/api/rest/1.0/sessions".to_string(),
            internal_url: "https://ot.internal/api/rest/1.0/sessions".to_string(),
        }
    }

    #[test]
    fn parse_urls() {
        const JSON: &str = r#"
{
    "publicUrl": "https://ot.example.com/api/rest/1.0/sessions",
    "internalUrl": "https://ot.internal/api/rest/1.0/sessions"
}
        "#;

        let parsed: SessionUrls = serde_json::from_str(JSON).unwrap();
        assert_eq!(parsed, urls());
    }

    #[test]
    fn parse_session_info() {
        const JSON: &str = r#"
{
    "admin": false,
    "timeToLive": 1800,
    "publicBaseUrl": "https://ot.example.com/api/rest",
    "privateBaseUrl": "https://ot.internal/api/rest",
    "capabilities": ["TELEPHONY_BASIC"]
}
        "#;

        let info = SessionInfo::from_json(JSON).unwrap();
        assert_eq!(info.admin, Some(false));
        assert_eq!(info.time_to_live, Some(1800));
        assert!(info.extra.contains_key("capabilities"));

        let session = Session::new(urls(), info);
        assert_eq!(session.keepalive_interval(), Duration::from_secs(900));
    }

    #[test]
    fn empty_session_info() {
        let info = SessionInfo::from_json("  ").unwrap();
        assert_eq!(info, SessionInfo::default());

        let session = Session::new(urls(), info);
        assert_eq!(session.keepalive_interval(), Duration::from_secs(300));
        assert_eq!(
            session.internal_url(),
            "https://ot.internal/api/rest/1.0/sessions"
        );
    }

    #[test]
    fn short_time_to_live() {
        let interval = |ttl| {
            let info = SessionInfo {
                time_to_live: Some(ttl),
                ..SessionInfo::default()
            };
            Session::new(urls(), info).keepalive_interval()
        };

        assert_eq!(interval(1), Duration::from_secs(1));
        assert_eq!(interval(3), Duration::from_secs(1));
        assert_eq!(interval(4), Duration::from_secs(2));
        assert_eq!(interval(0), Duration::from_secs(300));
    }

    #[test]
    fn invalid_session_info() {
        assert!(SessionInfo::from_json("<html></html>").is_err());
    }
}
