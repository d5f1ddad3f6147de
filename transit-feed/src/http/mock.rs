//! Scripted transport for tests.
//!
//! Responses are registered per (method, URL). Each call pops the next
//! scripted response; the last one is repeated once the queue runs dry.
//! Unscripted requests answer with a 404.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use reqwest::Url;
use reqwest::header::HeaderMap;

use super::client::HttpTransport;
use super::error::HttpError;

#[derive(Debug, Clone)]
pub enum MockResponse {
    Body(String),
    Status(u16),
}

impl MockResponse {
    fn into_result(self) -> Result<String, HttpError> {
        match self {
            MockResponse::Body(body) => Ok(body),
            MockResponse::Status(status) => Err(HttpError::Status {
                status,
                message: "scripted failure".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<(&'static str, String), VecDeque<MockResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(&self, url: &str, response: MockResponse) {
        self.script("GET", url, response);
    }

    pub fn on_post(&self, url: &str, response: MockResponse) {
        self.script("POST", url, response);
    }

    fn script(&self, method: &'static str, url: &str, response: MockResponse) {
        let key = (method, normalize(url));
        self.responses
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn respond(
        &self,
        method: &'static str,
        url: &Url,
        headers: &HeaderMap,
        body: Option<String>,
    ) -> Result<String, HttpError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });

        let mut responses = self.responses.lock().unwrap();
        let response = match responses.get_mut(&(method, url.to_string())) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        response
            .unwrap_or(MockResponse::Status(404))
            .into_result()
    }
}

/// Round-trip through `Url` so scripted keys match what the client sends.
fn normalize(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

impl HttpTransport for MockTransport {
    async fn get(&self, url: &Url, headers: &HeaderMap) -> Result<String, HttpError> {
        self.respond("GET", url, headers, None)
    }

    async fn post(&self, url: &Url, headers: &HeaderMap, body: String) -> Result<String, HttpError> {
        self.respond("POST", url, headers, Some(body))
    }
}
