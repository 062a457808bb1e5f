//! Gateway state
//!
//! Shared dependencies of every connection: the collaborators, the ephemeral
//! stores, and the coordinators built on top of them.

use std::sync::Arc;

use huddle_cache::{EphemeralSetStore, EventBus};
use huddle_common::{GatewayConfig, JwtService};
use huddle_core::{IdentityDirectory, MembershipChecker, MessageWriter, NotificationWriter};
use serde::Serialize;

use crate::broadcast::{BroadcastDispatcher, DispatchStats};
use crate::presence::PresenceTracker;
use crate::rooms::MembershipAuthority;
use crate::session::{RegistryStats, SessionRegistry};
use crate::typing::TypingCoordinator;

/// Relational collaborators owned by the platform's API service
#[derive(Clone)]
pub struct Collaborators {
    pub directory: Arc<dyn IdentityDirectory>,
    pub membership: Arc<dyn MembershipChecker>,
    pub messages: Arc<dyn MessageWriter>,
    pub notifications: Arc<dyn NotificationWriter>,
}

/// Counters reported by `/stats`
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GatewayStats {
    #[serde(flatten)]
    pub registry: RegistryStats,
    pub delivered: u64,
    pub dropped: u64,
}

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    config: Arc<GatewayConfig>,
    jwt: Arc<JwtService>,
    directory: Arc<dyn IdentityDirectory>,
    messages: Arc<dyn MessageWriter>,
    registry: Arc<SessionRegistry>,
    presence: Arc<PresenceTracker>,
    typing: Arc<TypingCoordinator>,
    dispatcher: Arc<BroadcastDispatcher>,
    membership: Arc<MembershipAuthority>,
}

impl GatewayState {
    /// Wire the coordinators together
    ///
    /// Background tasks are not running until [`GatewayState::start`].
    pub fn new(
        config: GatewayConfig,
        jwt: JwtService,
        collaborators: Collaborators,
        store: Arc<dyn EphemeralSetStore>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        let registry = SessionRegistry::new_shared();
        let dispatcher = Arc::new(BroadcastDispatcher::new(
            bus,
            registry.clone(),
            collaborators.notifications,
        ));
        let presence = Arc::new(PresenceTracker::new(store.clone(), config.presence_ttl()));
        let typing = Arc::new(TypingCoordinator::new(
            store,
            dispatcher.clone(),
            config.typing_ttl(),
        ));
        let membership = Arc::new(MembershipAuthority::new(
            collaborators.membership,
            registry.clone(),
            presence.clone(),
            typing.clone(),
            dispatcher.clone(),
        ));

        Self {
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            directory: collaborators.directory,
            messages: collaborators.messages,
            registry,
            presence,
            typing,
            dispatcher,
            membership,
        }
    }

    /// Start bus delivery and the typing sweeper
    pub fn start(&self) {
        self.dispatcher.start();
        self.typing.start_sweeper();
        tracing::info!("Gateway background tasks started");
    }

    /// Tear down every live session, then stop the background tasks
    ///
    /// Upgraded sockets outlive axum's graceful shutdown, so their presence
    /// is released here rather than left to expire.
    pub async fn shutdown(&self) {
        let session_ids = self.registry.session_ids();
        let mut released = 0;
        for session_id in &session_ids {
            if self.disconnect(session_id).await {
                released += 1;
            }
        }
        tracing::info!(sessions = released, "Live sessions released");
        self.stop();
    }

    /// Stop the typing sweeper and bus delivery without touching sessions
    pub fn stop(&self) {
        self.typing.stop_sweeper();
        self.dispatcher.stop();
        tracing::info!("Gateway background tasks stopped");
    }

    /// Tear a session down
    ///
    /// Removes it from the registry, releases presence and typing in every
    /// room it had joined, and announces departures. Runs at most once per
    /// session; returns whether this call did the work.
    pub async fn disconnect(&self, session_id: &str) -> bool {
        let Some((session, rooms)) = self.registry.remove(session_id) else {
            return false;
        };
        if !session.mark_torn_down() {
            return false;
        }

        let room_count = rooms.len();
        self.membership.release_all(&session, rooms).await;

        tracing::info!(
            session_id = %session_id,
            identity_id = %session.identity(),
            rooms = room_count,
            age_secs = session.age().as_secs(),
            "Session torn down"
        );
        true
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub fn directory(&self) -> &dyn IdentityDirectory {
        self.directory.as_ref()
    }

    pub fn messages(&self) -> &dyn MessageWriter {
        self.messages.as_ref()
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn presence(&self) -> &Arc<PresenceTracker> {
        &self.presence
    }

    pub fn typing(&self) -> &Arc<TypingCoordinator> {
        &self.typing
    }

    pub fn dispatcher(&self) -> &Arc<BroadcastDispatcher> {
        &self.dispatcher
    }

    pub fn membership(&self) -> &Arc<MembershipAuthority> {
        &self.membership
    }

    pub fn stats(&self) -> GatewayStats {
        let DispatchStats { delivered, dropped } = self.dispatcher.stats();
        GatewayStats {
            registry: self.registry.stats(),
            delivered,
            dropped,
        }
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
