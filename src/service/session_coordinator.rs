//! Session coordinator: applies connection events to room state.

use std::sync::Arc;

use crate::domain::state_machine::{self, RoomCommand, Transition};
use crate::domain::{
    BroadcastGateway, ConnectionEvent, ConnectionId, ConnectionRegistry, RoomEvent, RoomGuard,
    RoomId, RoomLocks,
};
use crate::error::GatewayError;
use crate::store::RoomStore;

/// Orchestration layer for every connection event.
///
/// Owns references to the [`RoomStore`] for state, the
/// [`ConnectionRegistry`] for connection identity, the [`BroadcastGateway`]
/// for delivery and the [`RoomLocks`] table. Every mutation follows the
/// pattern: lock room → get → apply → set → bookkeeping → emit → unlock.
/// If any store step fails nothing is broadcast and the registry and
/// broadcast groups are left untouched.
#[derive(Debug, Clone)]
pub struct SessionCoordinator {
    store: RoomStore,
    registry: Arc<ConnectionRegistry>,
    gateway: Arc<BroadcastGateway>,
    locks: Arc<RoomLocks>,
}

impl SessionCoordinator {
    /// Creates a coordinator from its collaborators.
    #[must_use]
    pub fn new(
        store: RoomStore,
        registry: Arc<ConnectionRegistry>,
        gateway: Arc<BroadcastGateway>,
        locks: Arc<RoomLocks>,
    ) -> Self {
        Self {
            store,
            registry,
            gateway,
            locks,
        }
    }

    /// Creates a coordinator over `store` with fresh in-process registry,
    /// gateway and lock table.
    #[must_use]
    pub fn with_store(store: RoomStore, queue_capacity: usize) -> Self {
        Self::new(
            store,
            Arc::new(ConnectionRegistry::new()),
            Arc::new(BroadcastGateway::new(queue_capacity)),
            Arc::new(RoomLocks::new()),
        )
    }

    /// Returns the room store.
    #[must_use]
    pub fn store(&self) -> &RoomStore {
        &self.store
    }

    /// Returns the connection registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Returns the broadcast gateway.
    #[must_use]
    pub fn gateway(&self) -> &Arc<BroadcastGateway> {
        &self.gateway
    }

    /// Handles one event from `conn_id`.
    ///
    /// Returns the number of deliveries made. Events that resolve to no
    /// room or no identity are quiet no-ops and return `Ok(0)`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] when the store could not
    /// be read or written in time (nothing was changed or broadcast), and
    /// [`GatewayError::CorruptState`] when the room entry is undecodable.
    pub async fn handle(
        &self,
        conn_id: ConnectionId,
        event: ConnectionEvent,
    ) -> Result<usize, GatewayError> {
        let event_type = event.event_type_str();
        let result = match event {
            ConnectionEvent::Join { room, name } => self.join(conn_id, &room, name).await,
            ConnectionEvent::Leave { room } => self.leave(conn_id, &room).await,
            ConnectionEvent::Vote { room, vote } => self.vote(conn_id, &room, vote).await,
            ConnectionEvent::RevealVotes { room } => self.reveal(&room).await,
            ConnectionEvent::ResetVotes { room } => self.reset(&room).await,
            ConnectionEvent::Disconnect => self.disconnect(conn_id).await,
        };
        match result {
            Err(e) if e.is_silent() => {
                tracing::debug!(%conn_id, event = event_type, reason = %e, "event ignored");
                Ok(0)
            }
            other => other,
        }
    }

    /// Adds `conn_id` to `room_id` as `name`, creating the room if needed.
    ///
    /// A connection already bound to another room leaves it first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store fails.
    pub async fn join(
        &self,
        conn_id: ConnectionId,
        room_id: &RoomId,
        name: String,
    ) -> Result<usize, GatewayError> {
        if let Some(previous) = self.registry.lookup(conn_id).await
            && &previous.room_id != room_id
        {
            tracing::debug!(%conn_id, from = %previous.room_id, to = %room_id, "switching rooms");
            match self.leave(conn_id, &previous.room_id).await {
                Err(e) if !e.is_silent() => return Err(e),
                _ => {}
            }
        }

        let guard = self.locks.lock(room_id).await;
        let command = RoomCommand::Join {
            conn_id,
            name: name.clone(),
        };
        let outcome = self.apply_and_persist(&guard, &command).await;
        let idle = is_idle(&outcome);
        let result = match outcome {
            Ok(transition) => {
                self.registry.bind(conn_id, room_id.clone(), name).await;
                self.gateway.subscribe(conn_id, room_id).await;
                let created = transition.effect == state_machine::Effect::Created;
                tracing::info!(%conn_id, %room_id, created, "user joined");
                Ok(self.dispatch(&guard, transition.events).await)
            }
            Err(e) => Err(e),
        };
        self.release(guard, idle).await;
        result
    }

    /// Removes `conn_id` from `room_id` and its broadcast group.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store fails, and
    /// the silent [`GatewayError::UnknownRoom`] /
    /// [`GatewayError::UnresolvedConnection`] when there is nothing to
    /// leave.
    pub async fn leave(&self, conn_id: ConnectionId, room_id: &RoomId) -> Result<usize, GatewayError> {
        let guard = self.locks.lock(room_id).await;
        let outcome = self
            .apply_and_persist(&guard, &RoomCommand::Leave { conn_id })
            .await;
        let idle = is_idle(&outcome);
        let result = match outcome {
            Ok(transition) => {
                self.gateway.unsubscribe(conn_id, room_id).await;
                self.registry.unbind_from(conn_id, room_id).await;
                tracing::info!(%conn_id, %room_id, "user left");
                Ok(self.dispatch(&guard, transition.events).await)
            }
            Err(e) => {
                if e.is_silent() {
                    self.gateway.unsubscribe(conn_id, room_id).await;
                    self.registry.unbind_from(conn_id, room_id).await;
                }
                Err(e)
            }
        };
        self.release(guard, idle).await;
        result
    }

    /// Records `vote` for the name `conn_id` joined `room_id` with.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store fails, and
    /// the silent [`GatewayError::UnresolvedConnection`] when the
    /// connection has not joined.
    pub async fn vote(
        &self,
        conn_id: ConnectionId,
        room_id: &RoomId,
        vote: String,
    ) -> Result<usize, GatewayError> {
        let command = RoomCommand::Vote {
            conn_id,
            value: vote,
        };
        self.apply_and_broadcast(room_id, &command).await
    }

    /// Broadcasts every vote in `room_id` with the numeric average.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store fails.
    pub async fn reveal(&self, room_id: &RoomId) -> Result<usize, GatewayError> {
        let delivered = self.apply_and_broadcast(room_id, &RoomCommand::Reveal).await?;
        tracing::info!(%room_id, "votes revealed");
        Ok(delivered)
    }

    /// Clears every vote in `room_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store fails.
    pub async fn reset(&self, room_id: &RoomId) -> Result<usize, GatewayError> {
        let delivered = self.apply_and_broadcast(room_id, &RoomCommand::Reset).await?;
        tracing::info!(%room_id, "votes reset");
        Ok(delivered)
    }

    /// Cleans up after a connection that went away.
    ///
    /// The connection's queue and group memberships are dropped first. The
    /// room comes from the registry; a connection with no binding has
    /// nothing to clean.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store fails; the
    /// binding is kept in that case so a retry can still find the room.
    pub async fn disconnect(&self, conn_id: ConnectionId) -> Result<usize, GatewayError> {
        self.gateway.deregister(conn_id).await;
        let Some(binding) = self.registry.lookup(conn_id).await else {
            return Err(GatewayError::UnresolvedConnection(conn_id));
        };
        let room_id = binding.room_id;

        let guard = self.locks.lock(&room_id).await;
        let outcome = self
            .apply_and_persist(&guard, &RoomCommand::Disconnect { conn_id })
            .await;
        let idle = is_idle(&outcome);
        let result = match outcome {
            Ok(transition) => {
                self.registry.unbind_from(conn_id, &room_id).await;
                tracing::info!(%conn_id, %room_id, name = %binding.name, "connection dropped");
                Ok(self.dispatch(&guard, transition.events).await)
            }
            Err(e) => {
                if e.is_silent() {
                    self.registry.unbind_from(conn_id, &room_id).await;
                }
                Err(e)
            }
        };
        self.release(guard, idle).await;
        result
    }

    /// Locks `room_id`, applies `command` and broadcasts its events.
    async fn apply_and_broadcast(
        &self,
        room_id: &RoomId,
        command: &RoomCommand,
    ) -> Result<usize, GatewayError> {
        let guard = self.locks.lock(room_id).await;
        let outcome = self.apply_and_persist(&guard, command).await;
        let idle = is_idle(&outcome);
        let result = match outcome {
            Ok(transition) => Ok(self.dispatch(&guard, transition.events).await),
            Err(e) => Err(e),
        };
        self.release(guard, idle).await;
        result
    }

    /// Loads the room under `guard`, applies `command` and writes the
    /// result back when it changed anything.
    async fn apply_and_persist(
        &self,
        guard: &RoomGuard,
        command: &RoomCommand,
    ) -> Result<Transition, GatewayError> {
        let room_id = guard.room_id();
        let current = self.store.get(room_id).await?;
        let transition = state_machine::apply(room_id, command, current.as_ref())?;
        if transition.needs_persist() {
            self.store.set(room_id, &transition.state).await?;
        }
        Ok(transition)
    }

    /// Emits `events` to the room under `guard`, in order.
    async fn dispatch(&self, guard: &RoomGuard, events: Vec<RoomEvent>) -> usize {
        let mut delivered = 0;
        for event in events {
            delivered += self.gateway.emit(guard.room_id(), event).await;
        }
        delivered
    }

    /// Unlocks the room and drops its lock entry if `idle`.
    async fn release(&self, guard: RoomGuard, idle: bool) {
        let room_id = guard.room_id().clone();
        drop(guard);
        if idle {
            self.locks.prune(&room_id).await;
        }
    }
}

/// Returns `true` when the room is left with no users or the event found
/// nothing to act on (missing room, unjoined connection, store failure).
///
/// Only a room still in use keeps its lock entry.
fn is_idle(outcome: &Result<Transition, GatewayError>) -> bool {
    match outcome {
        Ok(transition) => transition.state.is_dormant(),
        Err(_) => true,
    }
}
