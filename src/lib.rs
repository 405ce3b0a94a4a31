//! Client for the REST API of an OpenTouch telephony server.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use restcall::{api::Client, config::ClientConfig};
//!
//! let config = ClientConfig::new("https://ot.example.com", "jdoe", "secret", "RESTcall v0.6");
//! let client = Client::new(config)?;
//!
//! let session = client.authenticate().await?;
//! let _details = client.my_details(&session).await?;
//! client.logout(&session).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod logger;
