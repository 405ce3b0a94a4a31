//! Structured events emitted by the [`Client`](super::Client).

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::Operation;

/// Information about a single request to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub datetime: DateTime<Utc>,
    pub operation: Operation,
    pub method: String,
    pub url: String,
    pub duration_ms: i64,
    /// `None` if the server never answered
    pub response_code: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A request finished, successful or not.
    Request(Request),
    /// Couldn't connect to `from`, trying `to` instead.
    Fallback {
        operation: Operation,
        from: String,
        to: String,
    },
    /// A session was registered.
    SessionOpened { public_url: String },
    /// A session was closed by logging out.
    SessionClosed { public_url: String },
}

/// Receives every event the client emits.
pub trait Observer: Send + Sync {
    fn on_event(&self, event: &Event);
}

/// Writes events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn on_event(&self, event: &Event) {
        match event {
            Event::Request(req) => match req.response_code {
                Some(code) => log::info!(
                    "{} request to {} ({} - {}) took {}ms",
                    req.operation,
                    req.url,
                    req.method,
                    code,
                    req.duration_ms,
                ),
                None => log::warn!(
                    "{} request to {} ({}) failed after {}ms",
                    req.operation,
                    req.url,
                    req.method,
                    req.duration_ms,
                ),
            },
            Event::Fallback {
                operation,
                from,
                to,
            } => log::warn!("{}: couldn't reach {}, trying {}", operation, from, to),
            Event::SessionOpened { public_url } => {
                log::info!("session registered at {}", public_url)
            }
            Event::SessionClosed { public_url } => {
                log::info!("session at {} closed", public_url)
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryObserver {
    events: Mutex<Vec<Event>>,
}

impl MemoryObserver {
    pub fn new() -> MemoryObserver {
        MemoryObserver::default()
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Only the request events, in the order they were sent.
    pub fn requests(&self) -> Vec<Request> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Request(req) => Some(req.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Observer for MemoryObserver {
    fn on_event(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Event, MemoryObserver, Observer, Request};
    use crate::api::Operation;

    fn request(operation: Operation, code: Option<u16>) -> Event {
        Event::Request(Request {
            datetime: Utc::now(),
            operation,
            method: "GET".to_string(),
            url: "https://ot.example.com".to_string(),
            duration_ms: 3,
            response_code: code,
        })
    }

    #[test]
    fn memory_observer_records_in_order() {
        let observer = MemoryObserver::new();
        observer.on_event(&request(Operation::Discover, Some(200)));
        observer.on_event(&Event::SessionOpened {
            public_url: "https://ot.example.com/session".to_string(),
        });
        observer.on_event(&request(Operation::Register, None));

        assert_eq!(observer.events().len(), 3);

        let ops = observer
            .requests()
            .into_iter()
            .map(|r| (r.operation, r.response_code))
            .collect::<Vec<_>>();
        assert_eq!(
            ops,
            [(Operation::Discover, Some(200)), (Operation::Register, None)]
        );

        observer.clear();
        assert!(observer.events().is_empty());
    }
}
