use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of the register, keepalive and logout requests.
#[derive(Debug, Clone, Serialize)]
pub struct Identity<'a> {
    #[serde(rename = "ApplicationName")]
    pub application_name: &'a str,
}

/// Body of `POST /api/rest/1.0/telephony/basicCall`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    /// Device of the caller
    pub device_id: String,
    /// Number to be called
    pub callee: String,
    /// Suppress the caller's number
    pub anonymous: bool,
    /// Accept the callback from the server without ringing the device
    pub auto_answer: bool,
}

impl CallRequest {
    pub fn new(device_id: &str, callee: &str) -> CallRequest {
        CallRequest {
            device_id: device_id.to_string(),
            callee: callee.to_string(),
            anonymous: false,
            auto_answer: false,
        }
    }
}

/// Body of `POST /api/rest/1.0/telephony/basicCall/answer`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest<'a> {
    pub device_id: &'a str,
}

/// What the server answered to a placed call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CallResponse {
    #[serde(default)]
    pub call_ref: Option<String>,
}

/// A call that was accepted by the server (`201`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallHandle {
    pub device_id: String,
    pub callee: String,
    /// Reference the server assigned to the call, if it sent one
    pub call_ref: Option<String>,
}

/// A single entry of `GET /api/rest/1.0/logins`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRecord {
    pub login_name: String,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// The server either wraps the names (`{"loginNames": [..]}`) or sends a
/// plain list of records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Logins {
    Names {
        #[serde(rename = "loginNames")]
        login_names: Vec<String>,
    },
    Records(Vec<LoginRecord>),
}

impl From<Logins> for Vec<LoginRecord> {
    fn from(value: Logins) -> Self {
        match value {
            Logins::Records(records) => records,
            Logins::Names { login_names } => login_names
                .into_iter()
                .map(|login_name| LoginRecord {
                    login_name,
                    extra: HashMap::new(),
                })
                .collect(),
        }
    }
}

/// `devices[]` in the user details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    #[serde(rename = "type")]
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub sub_type: Option<String>,
}

/// `GET /api/rest/1.0/users/{username}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    #[serde(default)]
    pub login_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company_phone: Option<String>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// `GET /api/rest/1.0/users/{username}/preferences`
///
/// Not part of the documented API, the fields are what servers have been
/// seen to send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    /// `de`, `en`, `fr`, ...
    #[serde(default)]
    pub gui_language: Option<String>,
    #[serde(default)]
    pub personal_mobile: Option<String>,
    #[serde(default)]
    pub personal_phone: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}
