//! Exposes a `Client` struct to interact with the API.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::tls::Version;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::event::{self, Event, LogObserver, Observer};
use super::model::{
    AnswerRequest, CallHandle, CallRequest, CallResponse, Identity, LoginRecord, Logins,
    UserDetails, UserPreferences,
};
use super::{Error, Operation, Result, Session, SessionInfo, SessionUrls};
use crate::config::ClientConfig;

const AUTHENTICATE_PATH: &str = "/api/rest/authenticate?version=1.0";
const LOGINS_PATH: &str = "/api/rest/1.0/logins";
const USERS_PATH: &str = "/api/rest/1.0/users";
const BASIC_CALL_PATH: &str = "/api/rest/1.0/telephony/basicCall";

/// Characters that can't appear verbatim in a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn elapsed_ms(start: &Instant) -> i64 {
    start.elapsed().as_millis().min(i64::MAX as u128) as i64
}

/// Status and body of a response.
struct Reply {
    status: StatusCode,
    text: String,
}

pub struct Client {
    /// Use to make REST requests
    client: reqwest::Client,
    config: ClientConfig,
    /// Receives an event for every request
    observer: Arc<dyn Observer>,
}

impl Client {
    /// Create a new client to interact with the OpenTouch API.
    pub fn new(config: ClientConfig) -> anyhow::Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .min_tls_version(Version::TLS_1_2)
            .user_agent(config.software_id.as_str())
            .default_headers(headers)
            .cookie_store(true)
            .timeout(config.timeout)
            .connect_timeout(config.effective_connect_timeout());

        if let Some(pem) = config.root_cert.as_deref() {
            let root_cert = reqwest::Certificate::from_pem(pem).context("certificate is invalid")?;
            builder = builder.add_root_certificate(root_cert);
        }
        if !config.verify_tls {
            log::warn!("tls verification disabled, accepting invalid certs");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .context("invalid http client configuration")?;

        Ok(Client {
            client,
            config,
            observer: Arc::new(LogObserver),
        })
    }

    /// Send events somewhere else than the log.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Client {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn identity(&self) -> Identity<'_> {
        Identity {
            application_name: &self.config.software_id,
        }
    }

    /// Example: `client.make_urls("/api/rest/1.0/logins")` will produce
    /// `{external}/api/rest/1.0/logins` and `{internal}/api/rest/1.0/logins`
    /// if there is an internal base.
    fn make_urls(&self, path: &str) -> (String, Option<String>) {
        (
            format!("{}{}", self.config.external_url, path),
            self.config
                .internal_url
                .as_ref()
                .map(|base| format!("{}{}", base, path)),
        )
    }

    async fn request_with<F>(
        &self,
        operation: Operation,
        url: &str,
        method: Method,
        func: &F,
    ) -> Result<Reply>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let mut meta = event::Request {
            datetime: Utc::now(),
            operation,
            method: method.to_string(),
            url: url.to_string(),
            duration_ms: 0,
            response_code: None,
        };

        let now = Instant::now();
        let builder = self
            .client
            .request(method, url)
            .basic_auth(&self.config.username, Some(&self.config.password));

        let resp = match func(builder).send().await {
            Ok(resp) => resp,
            Err(err) => {
                meta.duration_ms = elapsed_ms(&now);
                self.observer.on_event(&Event::Request(meta));
                return Err(Error::from_transport(err));
            }
        };

        let status = resp.status();
        meta.response_code = Some(status.as_u16());

        let text = resp.text().await;
        meta.duration_ms = elapsed_ms(&now);
        self.observer.on_event(&Event::Request(meta));

        Ok(Reply {
            status,
            text: text.map_err(Error::from_transport)?,
        })
    }

    /// Send to `url`, if that can't be connected to try `fallback` exactly once.
    async fn request_with_fallback<F>(
        &self,
        operation: Operation,
        url: &str,
        fallback: Option<&str>,
        method: Method,
        func: F,
    ) -> Result<Reply>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        match self.request_with(operation, url, method.clone(), &func).await {
            Err(Error::ConnectionFailure(err)) => {
                let Some(fallback) = fallback else {
                    return Err(Error::ConnectionFailure(err));
                };
                self.observer.on_event(&Event::Fallback {
                    operation,
                    from: url.to_string(),
                    to: fallback.to_string(),
                });
                self.request_with(operation, fallback, method, &func).await
            }
            reply => reply,
        }
    }

    /// Request a path relative to the base urls and check the status.
    async fn call_api<F>(
        &self,
        operation: Operation,
        path: &str,
        method: Method,
        func: F,
    ) -> Result<String>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let (url, fallback) = self.make_urls(path);
        let reply = self
            .request_with_fallback(operation, &url, fallback.as_deref(), method, func)
            .await?;
        expect_status(operation, reply)
    }

    /// Log in: discover where to register a session, then register it.
    pub async fn authenticate(&self) -> Result<Session> {
        let text = self
            .call_api(Operation::Discover, AUTHENTICATE_PATH, Method::GET, |req| req)
            .await?;
        let urls: SessionUrls = parse_json(Operation::Discover, &text)?;

        let identity = self.identity();
        let reply = self
            .request_with_fallback(
                Operation::Register,
                &urls.public_url,
                Some(&urls.internal_url),
                Method::POST,
                |req| req.json(&identity),
            )
            .await?;
        let text = expect_status(Operation::Register, reply)?;

        let info = SessionInfo::from_json(&text).map_err(|source| Error::Decode {
            operation: Operation::Register,
            source,
        })?;

        self.observer.on_event(&Event::SessionOpened {
            public_url: urls.public_url.clone(),
        });
        Ok(Session::new(urls, info))
    }

    /// Keep the session from expiring.
    ///
    /// [`Error::SessionExpired`] means the server already dropped the
    /// session, authenticate again instead of retrying.
    pub async fn keepalive(&self, session: &Session) -> Result<()> {
        let url = format!("{}/keepalive", session.public_url());
        let fallback = format!("{}/keepalive", session.internal_url());
        let identity = self.identity();

        let reply = self
            .request_with_fallback(
                Operation::Keepalive,
                &url,
                Some(&fallback),
                Method::POST,
                |req| req.json(&identity),
            )
            .await?;
        expect_status(Operation::Keepalive, reply).map(|_| ())
    }

    /// Close the session.
    ///
    /// Logging out of a session that is gone yields [`Error::AlreadyClosed`]
    /// or a [`Error::ServerError`] with `session_missing` set.
    pub async fn logout(&self, session: &Session) -> Result<()> {
        let identity = self.identity();

        let reply = self
            .request_with_fallback(
                Operation::Logout,
                session.public_url(),
                Some(session.internal_url()),
                Method::DELETE,
                |req| req.json(&identity),
            )
            .await?;
        expect_status(Operation::Logout, reply)?;

        self.observer.on_event(&Event::SessionClosed {
            public_url: session.public_url().to_string(),
        });
        Ok(())
    }

    /// The currently logged in user, or every logged in user for an administrator.
    pub async fn current_logins(&self, _session: &Session) -> Result<Vec<LoginRecord>> {
        let text = self
            .call_api(Operation::Logins, LOGINS_PATH, Method::GET, |req| req)
            .await?;
        parse_json::<Logins>(Operation::Logins, &text).map(Vec::from)
    }

    pub async fn user_details(&self, _session: &Session, username: &str) -> Result<UserDetails> {
        let path = format!("{}/{}", USERS_PATH, encode_segment(username));
        let text = self
            .call_api(Operation::UserDetails, &path, Method::GET, |req| req)
            .await?;
        parse_json(Operation::UserDetails, &text)
    }

    pub async fn user_preferences(
        &self,
        _session: &Session,
        username: &str,
    ) -> Result<UserPreferences> {
        let path = format!("{}/{}/preferences", USERS_PATH, encode_segment(username));
        let text = self
            .call_api(Operation::UserPreferences, &path, Method::GET, |req| req)
            .await?;
        parse_json(Operation::UserPreferences, &text)
    }

    /// Details of the user this client logs in as.
    pub async fn my_details(&self, session: &Session) -> Result<UserDetails> {
        self.user_details(session, &self.config.username).await
    }

    /// Preferences of the user this client logs in as.
    pub async fn my_preferences(&self, session: &Session) -> Result<UserPreferences> {
        self.user_preferences(session, &self.config.username).await
    }

    /// Place a call from `device` to `callee`.
    ///
    /// [`Error::Unauthorized`] means the user lacks the right to make calls,
    /// [`Error::Forbidden`] that the server refused this one. A `201` with an
    /// unreadable body still returns a handle, without `call_ref`.
    pub async fn place_call(
        &self,
        session: &Session,
        device: &str,
        callee: &str,
        anonymous: bool,
        auto_answer: bool,
    ) -> Result<CallHandle> {
        let request = CallRequest {
            anonymous,
            auto_answer,
            ..CallRequest::new(device, callee)
        };
        self.place(session, request).await
    }

    pub async fn place(&self, _session: &Session, request: CallRequest) -> Result<CallHandle> {
        let text = self
            .call_api(Operation::PlaceCall, BASIC_CALL_PATH, Method::POST, |req| {
                req.json(&request)
            })
            .await?;

        // the call is up at this point, failing here would make the caller dial again
        let response = if text.trim().is_empty() {
            CallResponse::default()
        } else {
            parse_json::<CallResponse>(Operation::PlaceCall, &text).unwrap_or_else(|err| {
                log::warn!("call placed, ignoring unreadable response: {}", err);
                CallResponse::default()
            })
        };

        Ok(CallHandle {
            device_id: request.device_id,
            callee: request.callee,
            call_ref: response.call_ref,
        })
    }

    /// Answer the call ringing on `device`.
    ///
    /// The callback of a call placed with `auto_answer` unset can only be
    /// picked up on the handset. The server accepts the request, but the
    /// call won't be answered.
    pub async fn answer_call(&self, _session: &Session, device: &str) -> Result<()> {
        let path = format!("{}/answer", BASIC_CALL_PATH);
        let request = AnswerRequest { device_id: device };
        self.call_api(Operation::AnswerCall, &path, Method::POST, |req| {
            req.json(&request)
        })
        .await
        .map(|_| ())
    }

    /// Leave the current call.
    ///
    /// A call between two parties is released, a conference carries on
    /// without this user.
    pub async fn drop_current_call(&self, _session: &Session) -> Result<()> {
        let path = format!("{}/dropme", BASIC_CALL_PATH);
        self.call_api(Operation::DropCall, &path, Method::POST, |req| req)
            .await
            .map(|_| ())
    }
}

fn expect_status(operation: Operation, reply: Reply) -> Result<String> {
    if reply.status != operation.success() {
        return Err(operation.classify(reply.status));
    }
    Ok(reply.text)
}

fn parse_json<T: DeserializeOwned>(operation: Operation, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|source| Error::Decode { operation, source })
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}
