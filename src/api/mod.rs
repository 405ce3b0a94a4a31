mod client;
pub use client::Client;

mod error;
pub use error::{Error, Result};

pub mod event;
pub use event::{Event, LogObserver, MemoryObserver, Observer};

mod model;
pub use model::*;

mod operation;
pub use operation::{status_error, Operation};

mod session;
pub use session::{Session, SessionInfo, SessionUrls};
