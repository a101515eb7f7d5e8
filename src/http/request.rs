//! Request decoding — URI routing and `/timer` body parsing.
//!
//! Pure functions over `&str` / `&[u8]`, shared by the ESP-IDF server
//! binding and the host tests.  Routes:
//!
//! | Method | URI        | Body                          | Command          |
//! |--------|------------|-------------------------------|------------------|
//! | GET    | `/on{n}`   | —                             | `TurnOn(n)`      |
//! | GET    | `/off{n}`  | —                             | `TurnOff(n)`     |
//! | GET    | `/stop{n}` | —                             | `Stop(n)`        |
//! | POST   | `/timer`   | `relay&duration&interval`     | `StartCycle`     |
//! | GET    | `/status`  | —                             | status snapshot  |

use core::fmt;

use crate::app::commands::RelayCommand;
use crate::app::relay::{CycleSpec, RelayId};
use crate::error::Error;

/// Largest `/timer` body accepted, in bytes.
pub const MAX_BODY_LEN: usize = 100;

/// HTTP verbs the device serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
}

/// A fully decoded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Command(RelayCommand),
    Status,
}

/// Why a request could not be turned into a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// No route for this verb + path.
    NotFound,
    /// The route matched but the path suffix or body did not parse.
    Malformed(&'static str),
    /// Parsed fine, but the relay id or durations were rejected.
    Rejected(Error),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Malformed(why) => write!(f, "malformed request: {why}"),
            Self::Rejected(e) => write!(f, "{e}"),
        }
    }
}

impl From<Error> for RequestError {
    fn from(e: Error) -> Self {
        Self::Rejected(e)
    }
}

/// Decode a request into a command.  `max_phase_ms` bounds timer phases.
pub fn decode(
    verb: Verb,
    uri: &str,
    body: &[u8],
    max_phase_ms: u64,
) -> Result<Request, RequestError> {
    let path = uri.split_once('?').map_or(uri, |(p, _)| p);

    match verb {
        Verb::Post if path == "/timer" => {
            let (relay, on_ms, off_ms) = parse_timer_body(body)?;
            let relay = RelayId::from_raw(relay)?;
            let spec = CycleSpec::from_millis(relay, on_ms, off_ms, max_phase_ms)?;
            Ok(Request::Command(RelayCommand::StartCycle(spec)))
        }
        Verb::Get if path == "/status" => Ok(Request::Status),
        Verb::Get => {
            if let Some(n) = path.strip_prefix("/on") {
                Ok(Request::Command(RelayCommand::TurnOn(relay_suffix(n)?)))
            } else if let Some(n) = path.strip_prefix("/off") {
                Ok(Request::Command(RelayCommand::TurnOff(relay_suffix(n)?)))
            } else if let Some(n) = path.strip_prefix("/stop") {
                Ok(Request::Command(RelayCommand::Stop(relay_suffix(n)?)))
            } else {
                Err(RequestError::NotFound)
            }
        }
        Verb::Post => Err(RequestError::NotFound),
    }
}

/// Parse `relay&duration&interval`.  Each field may carry a `key=`
/// prefix, so form-encoded bodies (`relay=1&duration=500&interval=1000`)
/// are accepted too.
pub fn parse_timer_body(body: &[u8]) -> Result<(i64, i64, i64), RequestError> {
    if body.len() > MAX_BODY_LEN {
        return Err(RequestError::Malformed("body too large"));
    }
    let text = core::str::from_utf8(body)
        .map_err(|_| RequestError::Malformed("body is not UTF-8"))?
        .trim();

    let mut fields = text.split('&').map(field_value);
    let relay = next_number(&mut fields)?;
    let duration = next_number(&mut fields)?;
    let interval = next_number(&mut fields)?;
    if fields.next().is_some() {
        return Err(RequestError::Malformed("expected relay&duration&interval"));
    }
    Ok((relay, duration, interval))
}

fn field_value(field: &str) -> &str {
    field.split_once('=').map_or(field, |(_, v)| v).trim()
}

fn next_number<'a>(fields: &mut impl Iterator<Item = &'a str>) -> Result<i64, RequestError> {
    let field = fields
        .next()
        .ok_or(RequestError::Malformed("expected relay&duration&interval"))?;
    field
        .parse()
        .map_err(|_| RequestError::Malformed("field is not an integer"))
}

fn relay_suffix(suffix: &str) -> Result<RelayId, RequestError> {
    let raw: i64 = suffix
        .trim_start_matches('/')
        .parse()
        .map_err(|_| RequestError::Malformed("relay number expected after route"))?;
    Ok(RelayId::from_raw(raw)?)
}
