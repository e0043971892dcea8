//! Scripted stand-in for the mock expectation server.
//!
//! The server answers `/init` and `/expect` with canned responses and records
//! every request target it receives, so tests can assert on both the order of
//! calls and the encoded contract names.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow};
use parking_lot::Mutex;
use tiny_http::{Header, Response, Server, StatusCode};

/// Canned response for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl ScriptedResponse {
    /// A `200 OK` with an empty body.
    #[must_use]
    pub fn ok() -> Self {
        Self::with_status(200)
    }

    /// An empty response with the given status.
    #[must_use]
    pub const fn with_status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    /// A `200 OK` carrying an expectation report.
    #[must_use]
    pub fn expectations(failed: bool) -> Self {
        Self::json(&format!(r#"{{"expectations":{{"failed":{failed}}}}}"#))
    }

    /// A `200 OK` carrying an arbitrary body.
    #[must_use]
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_owned(),
        }
    }
}

/// Responses served by [`MockContractServer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerScript {
    /// Response to `GET /init`.
    pub init: ScriptedResponse,
    /// Response to `GET /expect`.
    pub expect: ScriptedResponse,
}

impl Default for ServerScript {
    fn default() -> Self {
        Self {
            init: ScriptedResponse::ok(),
            expect: ScriptedResponse::expectations(false),
        }
    }
}

/// Loopback HTTP server that replays a [`ServerScript`].
///
/// The server stops when dropped.
pub struct MockContractServer {
    server: Arc<Server>,
    port: u16,
    requests: Arc<Mutex<Vec<String>>>,
    worker: Option<JoinHandle<()>>,
}

impl MockContractServer {
    /// Binds an ephemeral port and starts serving `script`.
    ///
    /// # Errors
    ///
    /// Returns an error when the listener cannot be bound.
    pub fn start(script: ServerScript) -> Result<Self> {
        let server = Arc::new(Server::http("127.0.0.1:0").map_err(|err| anyhow!(err))?);
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| anyhow!("mock server is not bound to an IP address"))?;
        let requests = Arc::new(Mutex::new(Vec::new()));

        let worker = {
            let server_handle = Arc::clone(&server);
            let log = Arc::clone(&requests);
            thread::spawn(move || serve(&server_handle, &script, &log))
        };

        Ok(Self {
            server,
            port,
            requests,
            worker: Some(worker),
        })
    }

    /// Port the server listens on.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Request targets received so far, for example
    /// `/init?__contract__script__=payments_ok`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Request paths received so far, without query strings.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|target| target.split('?').next().unwrap_or_default().to_owned())
            .collect()
    }
}

impl std::fmt::Debug for MockContractServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockContractServer")
            .field("port", &self.port)
            .field("requests", &self.requests())
            .finish_non_exhaustive()
    }
}

impl Drop for MockContractServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            drop(worker.join());
        }
    }
}

fn serve(server: &Server, script: &ServerScript, log: &Mutex<Vec<String>>) {
    while let Ok(request) = server.recv() {
        let target = request.url().to_owned();
        log.lock().push(target.clone());

        let path = target.split('?').next().unwrap_or_default();
        let scripted = match path {
            "/init" => script.init.clone(),
            "/expect" => script.expect.clone(),
            _ => ScriptedResponse::with_status(404),
        };
        let mut response =
            Response::from_string(scripted.body).with_status_code(StatusCode(scripted.status));
        if let Ok(header) = Header::from_bytes("Content-Type", "application/json") {
            response = response.with_header(header);
        }
        if request.respond(response).is_err() {
            break;
        }
    }
}
