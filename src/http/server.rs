//! ESP-IDF HTTP server binding.
//!
//! Registers one `esp-idf-svc` handler per route family and forwards
//! each request through [`super::handle`].  Handlers run on the httpd
//! task; scheduler calls block only while a superseded cycle task is
//! being joined, which is bounded by its cancellation signal.

use std::sync::Arc;

use esp_idf_svc::http::Method;
use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::io::{Read, Write};
use log::info;

use super::request::{MAX_BODY_LEN, Verb};
use crate::app::ports::OutputPort;
use crate::config::SystemConfig;
use crate::scheduler::RelayScheduler;

const ROUTES: [(&str, Method, Verb); 5] = [
    ("/on*", Method::Get, Verb::Get),
    ("/off*", Method::Get, Verb::Get),
    ("/stop*", Method::Get, Verb::Get),
    ("/status", Method::Get, Verb::Get),
    ("/timer", Method::Post, Verb::Post),
];

/// Start the server and register every route.  The returned server must
/// be kept alive for the handlers to stay registered.
pub fn start<P: OutputPort + 'static>(
    scheduler: Arc<RelayScheduler<P>>,
    config: &SystemConfig,
) -> anyhow::Result<EspHttpServer<'static>> {
    let conf = Configuration {
        http_port: config.http_port,
        stack_size: config.http_stack_kb * 1024,
        uri_match_wildcard: true,
        ..Default::default()
    };
    let mut server = EspHttpServer::new(&conf)?;

    for (uri, method, verb) in ROUTES {
        let scheduler = scheduler.clone();
        server.fn_handler::<anyhow::Error, _>(uri, method, move |mut req| {
            let path = req.uri().to_string();
            let body = read_body(&mut req)?;
            let reply = super::handle(&scheduler, verb, &path, &body);
            req.into_response(reply.status, None, &[("Content-Type", reply.content_type)])?
                .write_all(reply.body.as_bytes())?;
            Ok(())
        })?;
    }

    info!("HTTP: listening on port {}", config.http_port);
    Ok(server)
}

/// Read up to `MAX_BODY_LEN + 1` bytes; one byte over the limit is
/// enough for the decoder to reject the body as too large.
fn read_body(
    req: &mut Request<&mut EspHttpConnection<'_>>,
) -> anyhow::Result<heapless::Vec<u8, { MAX_BODY_LEN + 1 }>> {
    let mut body = heapless::Vec::new();
    let mut chunk = [0u8; 32];
    while !body.is_full() {
        let room = body.capacity() - body.len();
        let n = req.read(&mut chunk[..room.min(chunk.len())])?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n])
            .map_err(|_| anyhow::anyhow!("request body overflow"))?;
    }
    Ok(body)
}
