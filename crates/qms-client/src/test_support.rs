//! Scripted transport for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::watch;

use qms_core::domain::{HttpMethod, HttpRequest};
use qms_core::ports::{Transport, TransportError, TransportResponse};

type Responder = Box<dyn Fn(&HttpRequest) -> Result<TransportResponse, TransportError> + Send + Sync>;

struct Route {
    method: HttpMethod,
    path: String,
    respond: Responder,
}

/// One request as the transport saw it.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: HttpRequest,
    pub bearer: Option<String>,
}

/// Transport answering from a route table, recording every call.
///
/// While held, requests are recorded and then wait for `release`.
pub struct FakeTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<RecordedCall>>,
    arrived: watch::Sender<usize>,
    open: watch::Sender<bool>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            arrived: watch::channel(0).0,
            open: watch::channel(true).0,
        })
    }

    pub fn on(
        &self,
        method: HttpMethod,
        path: &str,
        respond: impl Fn(&HttpRequest) -> Result<TransportResponse, TransportError> + Send + Sync + 'static,
    ) {
        self.routes.lock().unwrap().push(Route {
            method,
            path: path.to_string(),
            respond: Box::new(respond),
        });
    }

    pub fn on_json(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
        let bytes = serde_json::to_vec(&body).unwrap();
        self.on(method, path, move |_| Ok(TransportResponse::new(status, bytes.clone())));
    }

    pub fn on_error(&self, method: HttpMethod, path: &str, error: TransportError) {
        self.on(method, path, move |_| Err(error.clone()));
    }

    pub fn hold(&self) {
        self.open.send_replace(false);
    }

    pub fn release(&self) {
        self.open.send_replace(true);
    }

    /// Wait until at least `n` requests have arrived.
    pub async fn wait_for_calls(&self, n: usize) {
        let mut arrived = self.arrived.subscribe();
        let _ = arrived.wait_for(|count| *count >= n).await;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of requests sent to `path`.
    pub fn count(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.request.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(
        &self,
        request: &HttpRequest,
        bearer: Option<&str>,
    ) -> Result<TransportResponse, TransportError> {
        let total = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                request: request.clone(),
                bearer: bearer.map(str::to_string),
            });
            calls.len()
        };
        self.arrived.send_replace(total);

        let mut open = self.open.subscribe();
        let _ = open.wait_for(|open| *open).await;

        let routes = self.routes.lock().unwrap();
        // Later routes override earlier ones
        match routes
            .iter()
            .rev()
            .find(|route| route.method == request.method && route.path == request.path)
        {
            Some(route) => (route.respond)(request),
            None => Ok(TransportResponse::new(
                404,
                serde_json::to_vec(&json!({"message": format!("no route for {request}")})).unwrap(),
            )),
        }
    }
}
