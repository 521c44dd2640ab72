//! The orchestrator: owns the room state and wires the collaborators.

use std::sync::Arc;
use std::time::Duration;

use maestro_config::AppConfig;
use maestro_core::presence::PresenceSource;
use maestro_core::provider::Provider;
use maestro_core::transport::{RoomMessage, Transport};
use tokio::sync::{Mutex, OwnedMutexGuard, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::backlog::{ConversationBacklog, DEFAULT_MAX_BACKLOG, SharedBacklog};
use crate::dispatch::{self, DispatchCoordinator};
use crate::draw::TargetDraw;
use crate::poller::{DEFAULT_POLL_INTERVAL, PresencePoller};
use crate::prompt::OracleParams;
use crate::registry::{ParticipantRegistry, SharedRegistry};
use crate::resolver::{ResolvedTarget, TargetResolver};

/// Engine tuning, usually taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct MaestroSettings {
    /// The engine's own account id; never registered or routed to
    pub self_id: String,
    pub oracle: OracleParams,
    pub max_backlog: usize,
    pub poll_interval: Duration,
    /// Run resolve+dispatch for one message at a time
    pub serialize_resolution: bool,
}

impl MaestroSettings {
    pub fn new(self_id: impl Into<String>) -> Self {
        Self {
            self_id: self_id.into(),
            oracle: OracleParams::default(),
            max_backlog: DEFAULT_MAX_BACKLOG,
            poll_interval: DEFAULT_POLL_INTERVAL,
            serialize_resolution: false,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            self_id: config.user.clone(),
            oracle: OracleParams {
                model: config.model.clone(),
                temperature: config.temperature,
                max_tokens: Some(config.max_tokens),
            },
            max_backlog: config.max_backlog,
            poll_interval: config.poll_interval(),
            serialize_resolution: config.serialize_resolution,
        }
    }
}

/// One room's routing engine. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Maestro {
    self_id: String,
    registry: SharedRegistry,
    backlog: SharedBacklog,
    resolver: TargetResolver,
    dispatcher: DispatchCoordinator,
    presence: Arc<dyn PresenceSource>,
    poll_interval: Duration,
    resolution_gate: Option<Arc<Mutex<()>>>,
}

impl Maestro {
    pub fn new(
        settings: MaestroSettings,
        provider: Arc<dyn Provider>,
        transport: Arc<dyn Transport>,
        presence: Arc<dyn PresenceSource>,
    ) -> Self {
        let registry = ParticipantRegistry::new().shared();
        let backlog = ConversationBacklog::new(settings.max_backlog).shared();
        let resolver = TargetResolver::new(
            provider,
            registry.clone(),
            backlog.clone(),
            settings.oracle.clone(),
        );

        Self {
            self_id: settings.self_id,
            registry,
            backlog,
            resolver,
            dispatcher: DispatchCoordinator::new(transport),
            presence,
            poll_interval: settings.poll_interval,
            resolution_gate: settings
                .serialize_resolution
                .then(|| Arc::new(Mutex::new(()))),
        }
    }

    /// Replace the fallback ladder's random source.
    pub fn with_draw(mut self, draw: Arc<dyn TargetDraw>) -> Self {
        self.resolver = self.resolver.with_draw(draw);
        self
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    pub fn backlog(&self) -> SharedBacklog {
        self.backlog.clone()
    }

    /// Route one inbound message: learn the sender, resolve a target,
    /// dispatch. Returns the target, or `None` when nothing was sent.
    ///
    /// With serialized resolution, calls are routed one at a time in the
    /// order they reach the gate.
    pub async fn handle_incoming(&self, message: RoomMessage) -> Option<ResolvedTarget> {
        let _turn = self.take_turn().await;
        self.route(message).await
    }

    /// Handle inbound messages until the stream closes, then wait for the
    /// in-flight ones. Each message runs in its own task so a slow oracle
    /// call never blocks the next one, unless resolution is serialized: then
    /// the turn is taken here, before spawning, so arrival order is kept.
    pub async fn run(&self, mut inbound: mpsc::Receiver<RoomMessage>) {
        let mut tasks = JoinSet::new();

        while let Some(message) = inbound.recv().await {
            let turn = self.take_turn().await;
            let this = self.clone();
            tasks.spawn(async move {
                let _turn = turn;
                this.route(message).await;
            });

            // Drop finished tasks
            while tasks.try_join_next().is_some() {}
        }

        info!(in_flight = tasks.len(), "Inbound stream closed");
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Routing task failed");
            }
        }
    }

    async fn take_turn(&self) -> Option<OwnedMutexGuard<()>> {
        match &self.resolution_gate {
            Some(gate) => Some(gate.clone().lock_owned().await),
            None => None,
        }
    }

    async fn route(&self, message: RoomMessage) -> Option<ResolvedTarget> {
        if message.sender_id == self.self_id {
            debug!("Ignoring our own message");
            return None;
        }

        info!(sender = %message.sender_id, name = %message.display_name, "Incoming message");

        self.registry
            .write()
            .await
            .observe_speaker(&message.sender_id, &message.display_name);

        let Some(target) = self.resolver.resolve(&message).await else {
            error!(
                sender = %message.sender_id,
                "Critical: could not find a participant to send the message to"
            );
            return None;
        };

        info!(target = %target.participant_id, source = ?target.source, "Sending to target");

        let sends = {
            let registry = self.registry.read().await;
            dispatch::plan(&message, &target, &registry)
        };
        self.dispatcher.dispatch(&sends).await;

        Some(target)
    }

    /// Start refreshing the registry from the presence source.
    pub fn spawn_presence_poller(&self) -> JoinHandle<()> {
        PresencePoller::new(self.presence.clone(), self.registry.clone(), self.self_id.clone())
            .with_interval(self.poll_interval)
            .spawn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::TargetSource;
    use crate::test_helpers::{
        HeldProvider, RecordingTransport, ScriptedDraw, ScriptedPresence, ScriptedProvider,
    };
    use maestro_core::transport::SendKind;

    fn maestro(
        provider: ScriptedProvider,
        settings: MaestroSettings,
    ) -> (Maestro, Arc<RecordingTransport>, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        let transport = Arc::new(RecordingTransport::default());
        let engine = Maestro::new(
            settings,
            provider.clone(),
            transport.clone(),
            Arc::new(ScriptedPresence::ids(&[])),
        );
        (engine, transport, provider)
    }

    fn held(settings: MaestroSettings) -> (Maestro, Arc<HeldProvider>) {
        let provider = Arc::new(HeldProvider::new());
        let engine = Maestro::new(
            settings,
            provider.clone(),
            Arc::new(RecordingTransport::default()),
            Arc::new(ScriptedPresence::ids(&[])),
        );
        (engine, provider)
    }

    fn serialized() -> MaestroSettings {
        MaestroSettings {
            serialize_resolution: true,
            ..MaestroSettings::new("maestro")
        }
    }

    async fn wait_entered(provider: &HeldProvider) {
        tokio::time::timeout(Duration::from_secs(5), provider.entered.notified())
            .await
            .expect("oracle call started");
    }

    #[tokio::test]
    async fn learns_sender_and_dispatches() {
        let (engine, transport, _) =
            maestro(ScriptedProvider::answers(&["Bob"]), MaestroSettings::new("maestro"));
        engine.registry().write().await.observe_speaker("b", "Bob");
        engine.registry().write().await.upsert_from_presence(["c"]);

        let target = engine
            .handle_incoming(RoomMessage::new("a", "Alice", "Bob?"))
            .await
            .unwrap();

        assert_eq!(target.participant_id, "b");
        assert_eq!(engine.registry().read().await.get("a").unwrap().label(), "Alice");
        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].kind, SendKind::Visible);
        assert_eq!(sent[0].recipients, vec!["b"]);
        assert_eq!(sent[1].kind, SendKind::Silent);
        assert_eq!(sent[1].recipients, vec!["c"]);
    }

    #[tokio::test]
    async fn own_messages_ignored() {
        let (engine, transport, provider) =
            maestro(ScriptedProvider::answers(&["x"]), MaestroSettings::new("maestro"));

        let echo = RoomMessage::new("maestro", "Maestro", "echo");
        assert!(engine.handle_incoming(echo).await.is_none());
        assert!(engine.registry().read().await.is_empty());
        assert!(engine.backlog().read().await.is_empty());
        assert_eq!(provider.calls(), 0);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn backlog_capacity_comes_from_settings() {
        let settings = MaestroSettings {
            max_backlog: 2,
            ..MaestroSettings::new("maestro")
        };
        let (engine, _, _) = maestro(ScriptedProvider::answers(&[]), settings);
        for n in 0..4 {
            engine
                .handle_incoming(RoomMessage::new("a", "Alice", format!("m{n}")))
                .await;
        }
        let backlog = engine.backlog().read().await.as_ordered_sequence();
        assert_eq!(backlog.len(), 2);
        assert_eq!(backlog[0].content, "m2");
    }

    #[tokio::test]
    async fn scripted_draw_reaches_resolver() {
        let (engine, _, _) =
            maestro(ScriptedProvider::answers(&[""]), MaestroSettings::new("maestro"));
        let draw = Arc::new(ScriptedDraw::new(&[0]));
        let engine = engine.with_draw(draw.clone());

        let target = engine
            .handle_incoming(RoomMessage::new("a", "Alice", "alone"))
            .await
            .unwrap();
        assert_eq!(target.source, TargetSource::FallbackSelf);
        assert_eq!(draw.calls(), 5);
    }

    #[tokio::test]
    async fn run_waits_for_in_flight_messages() {
        let (engine, transport, provider) = maestro(
            ScriptedProvider::answers(&["Bob", "Alice"]),
            MaestroSettings::new("maestro"),
        );

        let (tx, rx) = mpsc::channel(4);
        tx.send(RoomMessage::new("a", "Alice", "hi Bob")).await.unwrap();
        tx.send(RoomMessage::new("b", "Bob", "hi Alice")).await.unwrap();
        drop(tx);

        engine.run(rx).await;

        assert_eq!(provider.calls(), 2);
        let visible = transport
            .sent()
            .iter()
            .filter(|s| s.kind == SendKind::Visible)
            .count();
        assert_eq!(visible, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn serialized_run_keeps_arrival_order() {
        let (engine, _, provider) = maestro(ScriptedProvider::answers(&[]), serialized());

        let sent: Vec<String> = (0..40).map(|n| format!("m{n:02}")).collect();
        let (tx, rx) = mpsc::channel(64);
        for (n, content) in sent.iter().enumerate() {
            let (id, name) = if n % 2 == 0 { ("a", "Alice") } else { ("b", "Bob") };
            tx.send(RoomMessage::new(id, name, content.clone())).await.unwrap();
        }
        drop(tx);

        engine.run(rx).await;

        let seen: Vec<String> = provider
            .requests()
            .iter()
            .map(|r| {
                let newest = &r.messages.last().unwrap().content;
                newest.rsplit(": ").next().unwrap().to_string()
            })
            .collect();
        assert_eq!(seen, sent);
    }

    #[tokio::test]
    async fn interleaved_resolution_holds_no_lock_across_oracle_call() {
        let (engine, provider) = held(MaestroSettings::new("maestro"));

        let first = tokio::spawn({
            let engine = engine.clone();
            async move { engine.handle_incoming(RoomMessage::new("a", "Alice", "one")).await }
        });
        wait_entered(&provider).await;

        let second = tokio::spawn({
            let engine = engine.clone();
            async move { engine.handle_incoming(RoomMessage::new("b", "Bob", "two")).await }
        });
        wait_entered(&provider).await;

        // Both calls are parked on the oracle; the second message got in anyway
        assert_eq!(provider.calls(), 2);
        assert_eq!(provider.max_in_flight(), 2);
        assert_eq!(engine.backlog().read().await.len(), 2);
        assert_eq!(engine.registry().read().await.len(), 2);

        provider.release(2);
        assert!(first.await.unwrap().is_some());
        assert!(second.await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn serialized_resolution_excludes_concurrent_calls() {
        let (engine, provider) = held(serialized());

        let first = tokio::spawn({
            let engine = engine.clone();
            async move { engine.handle_incoming(RoomMessage::new("a", "Alice", "one")).await }
        });
        wait_entered(&provider).await;

        let second = tokio::spawn({
            let engine = engine.clone();
            async move { engine.handle_incoming(RoomMessage::new("b", "Bob", "two")).await }
        });
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), provider.entered.notified()).await;
        assert!(blocked.is_err());
        assert_eq!(provider.calls(), 1);
        assert_eq!(engine.backlog().read().await.len(), 1);

        provider.release(1);
        wait_entered(&provider).await;
        assert_eq!(provider.calls(), 2);

        provider.release(1);
        assert!(first.await.unwrap().is_some());
        assert!(second.await.unwrap().is_some());
        assert_eq!(provider.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn presence_poller_fills_registry_without_self() {
        let engine = Maestro::new(
            MaestroSettings::new("maestro"),
            Arc::new(ScriptedProvider::answers(&[])),
            Arc::new(RecordingTransport::default()),
            Arc::new(ScriptedPresence::ids(&["maestro", "u1"])),
        );
        let handle = engine.spawn_presence_poller();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let reg = engine.registry();
        let reg = reg.read().await;
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.all()[0].id, "u1");
        handle.abort();
    }
}
