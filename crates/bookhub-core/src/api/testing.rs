//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, StatusCode};
use serde_json::Value;

use super::{HttpResponse, RequestDescriptor, Transport, TransportError};
use crate::auth::{CredentialStore, MemoryCredentialStore};

/// Replies with queued responses in order and records every request.
/// Running out of responses is reported as a transport failure.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<Result<HttpResponse, TransportError>>>>,
    requests: Arc<Mutex<Vec<RequestDescriptor>>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, status: u16, body: Value) -> Self {
        let status = StatusCode::from_u16(status).expect("valid status code");
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body.to_string())));
        self
    }

    pub(crate) fn reply_raw(self, status: u16, body: &str) -> Self {
        let status = StatusCode::from_u16(status).expect("valid status code");
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    pub(crate) fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(TransportError(message.to_string())));
        self
    }

    pub(crate) fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

/// The `Authorization` header value of a recorded request
pub(crate) fn authorization(request: &RequestDescriptor) -> Option<String> {
    request
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("no scripted response".to_string())))
    }
}

/// A store that serves reads from memory but refuses every write.
#[derive(Default)]
pub(crate) struct ReadOnlyStore {
    pub(crate) inner: MemoryCredentialStore,
}

impl CredentialStore for ReadOnlyStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        bail!("disk full")
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.inner.clear(key)
    }
}
