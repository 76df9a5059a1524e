// src/state.rs
use super::{registry::SubscriptionRegistry, repository::SettingsRepository, types::RepositoryEvent};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub type SharedRepository = Arc<SettingsRepository>;
pub type SharedRegistry = Arc<SubscriptionRegistry>;

// Repository -> dispatcher. Unbounded so committing writers never wait on pushes.
pub type EventSender = UnboundedSender<RepositoryEvent>;
pub type EventReceiver = UnboundedReceiver<RepositoryEvent>;

pub fn new_event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
