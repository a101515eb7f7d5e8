//! HTTP command surface.
//!
//! [`request`] decodes URIs and bodies into [`RelayCommand`]s; [`handle`]
//! runs them against the scheduler and builds the reply.  The ESP-IDF
//! server in [`server`] is a thin shim that feeds raw requests through
//! [`handle`], so the whole request path is testable on the host.
//!
//! ```text
//!  EspHttpServer ──▶ handle(verb, uri, body) ──▶ RelayScheduler
//!                          │
//!                          └──▶ Reply { status, content_type, body }
//! ```

pub mod request;
#[cfg(target_os = "espidf")]
pub mod server;

use log::{info, warn};
use serde::Serialize;

use crate::app::commands::RelayCommand;
use crate::app::ports::OutputPort;
use crate::app::relay::RELAY_COUNT;
use crate::error::Error;
use crate::scheduler::{RelayScheduler, RelayStatus};

use request::{Request, RequestError, Verb};

const TEXT: &str = "text/plain; charset=utf-8";
const JSON: &str = "application/json; charset=utf-8";

/// A response ready to be written to the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: TEXT,
            body: body.into(),
        }
    }
}

#[derive(Serialize)]
struct StatusReport {
    relays: [RelayStatus; RELAY_COUNT],
}

/// Map a firmware error to an HTTP status code.
pub fn status_code(e: &Error) -> u16 {
    match e {
        Error::UnknownRelay(_) => 404,
        Error::InvalidDuration(_) => 400,
        Error::HardwareWriteFailure(_) | Error::TaskSpawn(_) | Error::Config(_) => 500,
    }
}

/// Decode and execute one request.
pub fn handle<P: OutputPort + 'static>(
    scheduler: &RelayScheduler<P>,
    verb: Verb,
    uri: &str,
    body: &[u8],
) -> Reply {
    let max_phase_ms = scheduler.limits().max_phase_ms;
    match request::decode(verb, uri, body, max_phase_ms) {
        Ok(Request::Command(cmd)) => run(scheduler, cmd),
        Ok(Request::Status) => status(scheduler),
        Err(RequestError::NotFound) => Reply::text(404, "Not found"),
        Err(e @ RequestError::Malformed(_)) => {
            warn!("HTTP {:?} {}: {}", verb, uri, e);
            Reply::text(400, e.to_string())
        }
        Err(RequestError::Rejected(e)) => {
            warn!("HTTP {:?} {}: rejected: {}", verb, uri, e);
            Reply::text(status_code(&e), e.to_string())
        }
    }
}

fn run<P: OutputPort + 'static>(scheduler: &RelayScheduler<P>, cmd: RelayCommand) -> Reply {
    match scheduler.execute(cmd) {
        Ok(()) => {
            info!("HTTP: {} ({})", cmd.ack(), cmd.relay());
            Reply::text(200, cmd.ack())
        }
        Err(e) => {
            if e.is_rejection() {
                info!("HTTP: {:?} rejected: {}", cmd, e);
            } else {
                warn!("HTTP: {:?} failed: {}", cmd, e);
            }
            Reply::text(status_code(&e), e.to_string())
        }
    }
}

fn status<P: OutputPort + 'static>(scheduler: &RelayScheduler<P>) -> Reply {
    let report = StatusReport {
        relays: scheduler.status(),
    };
    match serde_json::to_string(&report) {
        Ok(body) => Reply {
            status: 200,
            content_type: JSON,
            body,
        },
        Err(e) => {
            warn!("HTTP: status encode failed: {}", e);
            Reply::text(500, "status unavailable")
        }
    }
}
