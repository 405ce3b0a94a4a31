//! Everything needed to construct a [`Client`](crate::api::Client).

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Value of `ot_external` in the login file template.
const TEMPLATE_EXTERNAL_URL: &str = "https://your-public-server-FQDN";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Example: `https://ot.example.com`
    pub(crate) external_url: String,
    /// Tried once if `external_url` can't be connected to
    pub(crate) internal_url: Option<String>,
    pub(crate) username: String,
    pub(crate) password: String,
    /// Sent as `User-Agent` and as `ApplicationName`
    pub(crate) software_id: String,
    pub(crate) verify_tls: bool,
    /// PEM encoded
    pub(crate) root_cert: Option<Vec<u8>>,
    pub(crate) timeout: Duration,
    /// A connect that takes longer counts as a connection failure
    pub(crate) connect_timeout: Duration,
}

impl ClientConfig {
    pub fn new(external_url: &str, username: &str, password: &str, software_id: &str) -> Self {
        ClientConfig {
            external_url: trim_base(external_url),
            internal_url: None,
            username: username.to_string(),
            password: password.to_string(),
            software_id: software_id.to_string(),
            verify_tls: true,
            root_cert: None,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn internal_url(mut self, internal_url: &str) -> Self {
        self.internal_url = Some(trim_base(internal_url));
        self
    }

    /// Set to `false` if the server doesn't have a valid certificate.
    pub fn verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    pub fn root_cert(mut self, pem: &[u8]) -> Self {
        self.root_cert = Some(pem.to_vec());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// The connect phase has to give up well before the whole request does,
    /// otherwise an unreachable host ends as a timeout instead of a
    /// connection failure.
    pub(crate) fn effective_connect_timeout(&self) -> Duration {
        self.connect_timeout.min(self.timeout / 2)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn software_id(&self) -> &str {
        &self.software_id
    }

    /// Load the configuration from environment variables (and `.env`).
    ///
    /// Required: `OPENTOUCH_EXTERNAL_URL`, `OPENTOUCH_USERNAME`, `OPENTOUCH_PASSWORD`.
    ///
    /// Optional: `OPENTOUCH_INTERNAL_URL`, `OPENTOUCH_ROOT_CERT_PATH`,
    /// `OPENTOUCH_VERIFY_TLS`, `OPENTOUCH_TIMEOUT_SECS`,
    /// `OPENTOUCH_CONNECT_TIMEOUT_SECS`.
    pub fn from_env(software_id: &str) -> anyhow::Result<ClientConfig> {
        fn required(key: &str) -> anyhow::Result<String> {
            dotenv::var(key).with_context(|| format!("couldn't find env var {}", key))
        }

        let mut config = ClientConfig::new(
            &required("OPENTOUCH_EXTERNAL_URL")?,
            &required("OPENTOUCH_USERNAME")?,
            &required("OPENTOUCH_PASSWORD")?,
            software_id,
        );

        if let Ok(internal_url) = dotenv::var("OPENTOUCH_INTERNAL_URL") {
            config = config.internal_url(&internal_url);
        }
        if let Ok(verify_tls) = dotenv::var("OPENTOUCH_VERIFY_TLS") {
            let verify_tls = verify_tls
                .parse::<bool>()
                .context("parse OPENTOUCH_VERIFY_TLS")?;
            config = config.verify_tls(verify_tls);
        }
        if let Ok(timeout) = dotenv::var("OPENTOUCH_TIMEOUT_SECS") {
            let timeout = timeout
                .parse::<u64>()
                .context("parse OPENTOUCH_TIMEOUT_SECS")?;
            config = config.timeout(Duration::from_secs(timeout));
        }
        if let Ok(timeout) = dotenv::var("OPENTOUCH_CONNECT_TIMEOUT_SECS") {
            let timeout = timeout
                .parse::<u64>()
                .context("parse OPENTOUCH_CONNECT_TIMEOUT_SECS")?;
            config = config.connect_timeout(Duration::from_secs(timeout));
        }
        if let Ok(path) = dotenv::var("OPENTOUCH_ROOT_CERT_PATH") {
            let pem = std::fs::read(&path)
                .with_context(|| format!("couldn't find root cert at {}", path))?;
            config = config.root_cert(&pem);
        }

        Ok(config)
    }
}

/// `https://ot.example.com/` and `https://ot.example.com` are the same base.
fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// The `login.json` credentials file.
///
/// ```json
/// {
///     "ot_external": "https://your-public-server-FQDN",
///     "ot_internal": "https://your-internal-server-FQDN",
///     "username": "user",
///     "password": "secret"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LoginFile {
    pub ot_external: String,
    #[serde(default)]
    pub ot_internal: Option<String>,
    pub username: String,
    /// Can be left out and asked for interactively
    #[serde(default)]
    pub password: Option<String>,
}

impl LoginFile {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<LoginFile> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("couldn't read login file {}", path.display()))?;
        LoginFile::from_json(&text)
    }

    pub fn from_json(text: &str) -> anyhow::Result<LoginFile> {
        let login: LoginFile = serde_json::from_str(text).context("couldn't read json format")?;
        if trim_base(&login.ot_external) == TEMPLATE_EXTERNAL_URL {
            anyhow::bail!("login file still contains the template values");
        }
        Ok(login)
    }

    /// `password` is used if the file doesn't contain one.
    pub fn into_config(self, software_id: &str, password: Option<&str>) -> anyhow::Result<ClientConfig> {
        let password = self
            .password
            .as_deref()
            .or(password)
            .context("no password in login file")?;

        let mut config = ClientConfig::new(&self.ot_external, &self.username, password, software_id);
        if let Some(internal_url) = self.ot_internal.as_deref() {
            config = config.internal_url(internal_url);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ClientConfig, LoginFile, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT};

    #[test]
    fn builder() {
        let config = ClientConfig::new("https://ot.example.com/", "jdoe", "secret", "RESTcall v0.6")
            .internal_url("https://ot.internal/")
            .verify_tls(false)
            .timeout(Duration::from_secs(5));

        assert_eq!(config.external_url, "https://ot.example.com");
        assert_eq!(config.internal_url.as_deref(), Some("https://ot.internal"));
        assert!(!config.verify_tls);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.software_id(), "RESTcall v0.6");

        let config = ClientConfig::new("https://ot.example.com", "jdoe", "secret", "x");
        assert!(config.verify_tls);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.internal_url, None);
    }

    #[test]
    fn connect_timeout_below_timeout() {
        let config = ClientConfig::new("https://ot.example.com", "jdoe", "secret", "x");
        assert_eq!(config.effective_connect_timeout(), DEFAULT_CONNECT_TIMEOUT);

        let config = config.timeout(Duration::from_secs(4));
        assert_eq!(config.effective_connect_timeout(), Duration::from_secs(2));

        let config = config
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_millis(500));
        assert_eq!(config.effective_connect_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn login_file() {
        const JSON: &str = r#"
{
    "ot_external": "https://ot.example.com",
    "ot_internal": "https://ot.internal",
    "username": "jdoe",
    "password": "secret"
}
        "#;

        let config = LoginFile::from_json(JSON)
            .unwrap()
            .into_config("RESTcall v0.6", None)
            .unwrap();
        assert_eq!(config.external_url, "https://ot.example.com");
        assert_eq!(config.internal_url.as_deref(), Some("https://ot.internal"));
        assert_eq!(config.username(), "jdoe");
        assert_eq!(config.password, "secret");
    }

    #[test]
    fn login_file_without_password() {
        const JSON: &str = r#"{ "ot_external": "https://ot.example.com", "username": "jdoe" }"#;

        let login = LoginFile::from_json(JSON).unwrap();
        assert!(login.clone().into_config("x", None).is_err());

        let config = login.into_config("x", Some("prompted")).unwrap();
        assert_eq!(config.password, "prompted");
        assert_eq!(config.internal_url, None);
    }

    #[test]
    fn login_file_template_rejected() {
        const JSON: &str = r#"
{
    "ot_external": "https://your-public-server-FQDN",
    "ot_internal": "https://your-internal-server-FQDN",
    "username": "user",
    "password": "password"
}
        "#;

        assert!(LoginFile::from_json(JSON).is_err());
        assert!(LoginFile::from_json("{ not json").is_err());
    }
}
