//! Shared scripted collaborators for engine tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use maestro_core::error::{PresenceError, ProviderError, TransportError};
use maestro_core::message::Message;
use maestro_core::presence::PresenceSource;
use maestro_core::provider::{Provider, ProviderRequest, ProviderResponse};
use maestro_core::transport::{RoomCredentials, RoomMessage, SendKind, Transport};
use tokio::sync::{Notify, Semaphore, mpsc};

use crate::draw::TargetDraw;

/// Returns scripted oracle answers in order and records every request.
/// Once the script runs out, every call fails.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn answers(answers: &[&str]) -> Self {
        Self::new(answers.iter().map(|a| Ok(a.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::NotConfigured("script exhausted".into())));
        next.map(|answer| ProviderResponse {
            message: Message::assistant(answer),
            usage: None,
            model: "mock".into(),
        })
    }
}

/// Oracle whose calls park until the test hands out a permit.
/// `entered` is notified each time a call starts waiting.
pub struct HeldProvider {
    pub entered: Notify,
    release: Semaphore,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl HeldProvider {
    pub fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn release(&self, calls: usize) {
        self.release.add_permits(calls);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for HeldProvider {
    fn name(&self) -> &str {
        "held"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.entered.notify_one();

        if let Ok(permit) = self.release.acquire().await {
            permit.forget();
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(ProviderResponse {
            message: Message::assistant(""),
            usage: None,
            model: "mock".into(),
        })
    }
}

/// One recorded outbound send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub kind: SendKind,
    pub display_name: String,
    pub content: String,
    pub recipients: Vec<String>,
}

/// Records sends instead of delivering them.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, kind: SendKind, display_name: &str, content: &str, recipients: &[String]) {
        self.sent.lock().unwrap().push(SentMessage {
            kind,
            display_name: display_name.into(),
            content: content.into(),
            recipients: recipients.to_vec(),
        });
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn connect(
        &self,
        _credentials: &RoomCredentials,
    ) -> Result<mpsc::Receiver<RoomMessage>, TransportError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn send_visible(
        &self,
        display_name: &str,
        content: &str,
        recipients: &[String],
    ) -> Result<(), TransportError> {
        self.record(SendKind::Visible, display_name, content, recipients);
        Ok(())
    }

    async fn send_silent(
        &self,
        display_name: &str,
        content: &str,
        recipients: &[String],
    ) -> Result<(), TransportError> {
        self.record(SendKind::Silent, display_name, content, recipients);
        Ok(())
    }
}

/// Presence results served in order; empty lists once exhausted.
pub struct ScriptedPresence {
    script: Mutex<VecDeque<Result<Vec<String>, PresenceError>>>,
    fetches: AtomicUsize,
}

impl ScriptedPresence {
    pub fn new(script: Vec<Result<Vec<String>, PresenceError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn ids(ids: &[&str]) -> Self {
        Self::new(vec![Ok(ids.iter().map(|s| s.to_string()).collect())])
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PresenceSource for ScriptedPresence {
    async fn fetch_participants(&self) -> Result<Vec<String>, PresenceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Replays a fixed index sequence, repeating the final entry.
pub struct ScriptedDraw {
    picks: Vec<usize>,
    calls: AtomicUsize,
}

impl ScriptedDraw {
    pub fn new(picks: &[usize]) -> Self {
        Self {
            picks: picks.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TargetDraw for ScriptedDraw {
    fn draw(&self, len: usize) -> usize {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let pick = self.picks.get(n).or(self.picks.last()).copied().unwrap_or(0);
        pick % len
    }
}
