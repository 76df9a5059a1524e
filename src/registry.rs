// src/registry.rs
//! Who listens to which configuration, and fan-out of change events to them.

use crate::{
    push::ClientChannel,
    repository::RepositoryError,
    types::{ChangeEvent, ClientId, Target},
};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Existence check used before the first subscription to a target.
#[async_trait]
pub trait ConfigurationLookup: Send + Sync {
    async fn configuration_exists(&self, user_id: i64, configuration_id: i64) -> Result<bool, RepositoryError>;
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Configuration {configuration_id} of user {user_id} does not exist")]
    TargetNotFound { user_id: i64, configuration_id: i64 },
    #[error("Client {0} is not known")]
    ClientNotFound(ClientId),
    #[error(transparent)]
    Lookup(#[from] RepositoryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    AlreadySubscribed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Unsubscribed,
    WasNotSubscribed,
}

/// Outbound queue of one client. A single worker task drains it, so pushes
/// to the same client leave in the order they were dispatched.
#[derive(Clone)]
pub struct ClientSender {
    client_id: ClientId,
    queue: mpsc::UnboundedSender<Arc<ChangeEvent>>,
}

impl ClientSender {
    fn spawn(client_id: ClientId, channel: Arc<dyn ClientChannel>) -> Self {
        let (queue, mut pending) = mpsc::unbounded_channel::<Arc<ChangeEvent>>();
        let worker_id = client_id.clone();
        tokio::spawn(async move {
            while let Some(event) = pending.recv().await {
                if let Err(e) = channel.send(&worker_id, &event).await {
                    warn!("⚠️ [DISPATCH] Delivery to {} failed: {}", worker_id, e);
                }
            }
            debug!("📭 [DISPATCH] Outbox of {} closed.", worker_id);
        });
        Self { client_id, queue }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns false if the worker has already stopped.
    pub fn enqueue(&self, event: Arc<ChangeEvent>) -> bool {
        self.queue.send(event).is_ok()
    }
}

#[derive(Default)]
struct RegistryState {
    subscribers_by_target: HashMap<Target, HashSet<ClientId>>,
    targets_by_client: HashMap<ClientId, HashSet<Target>>,
    // Lives from the client's first subscription until `remove_client`.
    senders: HashMap<ClientId, ClientSender>,
}

pub struct SubscriptionRegistry {
    state: Mutex<RegistryState>,
    lookup: Arc<dyn ConfigurationLookup>,
    channel: Arc<dyn ClientChannel>,
}

impl SubscriptionRegistry {
    pub fn new(lookup: Arc<dyn ConfigurationLookup>, channel: Arc<dyn ClientChannel>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            lookup,
            channel,
        }
    }

    pub async fn subscribe(&self, client_id: &str, target: Target) -> Result<SubscribeOutcome, RegistryError> {
        let mut state = self.state.lock().await;

        match state.subscribers_by_target.get(&target) {
            Some(clients) if clients.contains(client_id) => {
                return Ok(SubscribeOutcome::AlreadySubscribed);
            }
            Some(_) => {}
            None => {
                if !self
                    .lookup
                    .configuration_exists(target.user_id, target.configuration_id)
                    .await?
                {
                    return Err(RegistryError::TargetNotFound {
                        user_id: target.user_id,
                        configuration_id: target.configuration_id,
                    });
                }
            }
        }

        state
            .subscribers_by_target
            .entry(target)
            .or_default()
            .insert(client_id.to_string());
        state
            .targets_by_client
            .entry(client_id.to_string())
            .or_default()
            .insert(target);
        let channel = &self.channel;
        state
            .senders
            .entry(client_id.to_string())
            .or_insert_with(|| ClientSender::spawn(client_id.to_string(), channel.clone()));

        info!("🔔 [REGISTRY] {} -> {:?}", client_id, target);
        Ok(SubscribeOutcome::Subscribed)
    }

    pub async fn unsubscribe(&self, client_id: &str, target: Target) -> UnsubscribeOutcome {
        let mut state = self.state.lock().await;

        let removed = match state.subscribers_by_target.get_mut(&target) {
            Some(clients) => {
                let removed = clients.remove(client_id);
                if clients.is_empty() {
                    state.subscribers_by_target.remove(&target);
                }
                removed
            }
            None => false,
        };
        if let Some(targets) = state.targets_by_client.get_mut(client_id) {
            targets.remove(&target);
        }

        if removed {
            info!("🔕 [REGISTRY] {} -x- {:?}", client_id, target);
            UnsubscribeOutcome::Unsubscribed
        } else {
            UnsubscribeOutcome::WasNotSubscribed
        }
    }

    /// Forgets the client entirely. Returns false if it was never seen.
    pub async fn remove_client(&self, client_id: &str) -> bool {
        let mut state = self.state.lock().await;
        let Some(targets) = state.targets_by_client.remove(client_id) else {
            return false;
        };
        // Dropping the sender closes the queue; the worker exits once it is drained.
        state.senders.remove(client_id);

        for target in &targets {
            if let Some(clients) = state.subscribers_by_target.get_mut(target) {
                clients.remove(client_id);
                if clients.is_empty() {
                    state.subscribers_by_target.remove(target);
                }
            }
        }
        info!("👋 [REGISTRY] Removed client {} ({} subscriptions)", client_id, targets.len());
        true
    }

    /// Drops every subscription to a target that no longer exists.
    pub async fn drop_target(&self, target: Target) -> usize {
        let mut state = self.state.lock().await;
        let Some(clients) = state.subscribers_by_target.remove(&target) else {
            return 0;
        };
        for client in &clients {
            if let Some(targets) = state.targets_by_client.get_mut(client) {
                targets.remove(&target);
            }
        }
        debug!("🧹 [REGISTRY] Dropped {:?} with {} subscriber(s)", target, clients.len());
        clients.len()
    }

    pub async fn list_clients(&self) -> Vec<ClientId> {
        let state = self.state.lock().await;
        let mut clients: Vec<_> = state.targets_by_client.keys().cloned().collect();
        clients.sort();
        clients
    }

    pub async fn list_subscriptions(&self, client_id: &str) -> Result<Vec<Target>, RegistryError> {
        let state = self.state.lock().await;
        state
            .targets_by_client
            .get(client_id)
            .map(|targets| targets.iter().copied().collect::<BTreeSet<_>>().into_iter().collect())
            .ok_or_else(|| RegistryError::ClientNotFound(client_id.to_string()))
    }

    /// Queues the event for every current subscriber of its target and
    /// returns how many clients it was queued for. Delivery happens on each
    /// client's worker, so a slow or failing client never holds up the rest.
    pub async fn dispatch(&self, event: ChangeEvent) -> usize {
        let target = event.target();
        let event = Arc::new(event);
        let state = self.state.lock().await;
        let Some(clients) = state.subscribers_by_target.get(&target) else {
            debug!("📤 [DISPATCH] {:?} has no subscribers", target);
            return 0;
        };

        let mut queued = 0;
        for client_id in clients {
            match state.senders.get(client_id) {
                Some(sender) if sender.enqueue(event.clone()) => queued += 1,
                _ => warn!("⚠️ [DISPATCH] No live outbox for {}", client_id),
            }
        }
        debug!("📤 [DISPATCH] {:?} -> {} client(s)", target, queued);
        queued
    }
}
