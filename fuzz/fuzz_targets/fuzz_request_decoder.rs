//! Fuzz target: `http::request::decode`
//!
//! Splits the input into a URI and a body and drives both verbs through
//! the decoder.  It must never panic, and any accepted timer request must
//! carry phases within the limit and not both zero.
//!
//! cargo fuzz run fuzz_request_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use pumpctl::app::commands::RelayCommand;
use pumpctl::http::request::{decode, Request, Verb};

const MAX_PHASE_MS: u64 = 86_400_000;

fuzz_target!(|data: &[u8]| {
    let split = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let (uri, body) = data.split_at(split);
    let uri = String::from_utf8_lossy(uri);
    let body = body.get(1..).unwrap_or_default();

    for verb in [Verb::Get, Verb::Post] {
        if let Ok(Request::Command(RelayCommand::StartCycle(spec))) =
            decode(verb, &uri, body, MAX_PHASE_MS)
        {
            assert!(spec.on_ms() <= MAX_PHASE_MS && spec.off_ms() <= MAX_PHASE_MS);
            assert!(spec.on_ms() > 0 || spec.off_ms() > 0, "both phases zero accepted");
        }
    }
});
