//! In-memory `HttpClient` doubles for unit tests

use crate::crawler::fetcher::{HttpClient, HttpResponse, TransportError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type Reply = Result<HttpResponse, TransportError>;

/// Replays a fixed sequence of replies regardless of URL
pub struct ScriptedClient {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(script: Vec<Reply>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Err(TransportError::Other("script exhausted".to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn repeating(response: HttpResponse) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Ok(response),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn repeating_error(error: TransportError) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Serves fixed HTML bodies keyed by exact URL; unknown URLs get a 404
#[derive(Default)]
pub struct PageClient {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl PageClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }

    /// Every URL requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl HttpClient for PageClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(body) => Ok(HttpResponse {
                status: 200,
                body: body.clone().into_bytes(),
            }),
            None => Ok(HttpResponse {
                status: 404,
                body: b"not found".to_vec(),
            }),
        }
    }
}
