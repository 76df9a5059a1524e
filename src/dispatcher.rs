// src/dispatcher.rs

use crate::{registry::SubscriptionRegistry, state::EventReceiver, types::RepositoryEvent};
use std::sync::Arc;
use tracing::{debug, info};

/// Consumes repository events until every sender is gone.
pub async fn run_dispatcher(registry: Arc<SubscriptionRegistry>, mut events: EventReceiver) {
    info!("🚀 [DISPATCH] Dispatcher started.");
    while let Some(event) = events.recv().await {
        match event {
            RepositoryEvent::Changed(change) => {
                registry.dispatch(change).await;
            }
            RepositoryEvent::Removed(target) => {
                let dropped = registry.drop_target(target).await;
                if dropped > 0 {
                    debug!("🧹 [DISPATCH] {:?} removed, {} subscription(s) dropped", target, dropped);
                }
            }
        }
    }
    info!("🛑 [DISPATCH] Event channel closed. Dispatcher stopped.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        connect_database,
        registry::tests::RecordingChannel,
        repository::{init_db, SettingsRepository},
        state::new_event_channel,
        types::{ChangeEvent, ClientId, ConfigurationPayload, Target, TextOptions, UserPayload},
    };
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Harness {
        repository: SettingsRepository,
        registry: Arc<SubscriptionRegistry>,
        pushes: UnboundedReceiver<(ClientId, ChangeEvent)>,
        target: Target,
    }

    async fn harness() -> Harness {
        let pool = connect_database("sqlite::memory:", 1).await.unwrap();
        init_db(&pool).await.unwrap();
        let (tx, rx) = new_event_channel();
        let repository = SettingsRepository::with_events(pool, tx);
        let (channel, pushes) = RecordingChannel::new();
        let registry = Arc::new(SubscriptionRegistry::new(Arc::new(repository.clone()), channel));
        tokio::spawn(run_dispatcher(registry.clone(), rx));

        let user = repository
            .add_user(&UserPayload { username: "u1".into(), name: "User One".into() })
            .await
            .unwrap();
        let configuration = repository
            .create_configuration(user.id, &payload("editor", 12))
            .await
            .unwrap();

        Harness {
            repository,
            registry,
            pushes,
            target: configuration.target(),
        }
    }

    fn payload(name: &str, font_size: i32) -> ConfigurationPayload {
        ConfigurationPayload {
            configuration_name: name.into(),
            text_options: TextOptions::new("Fira", font_size),
        }
    }

    async fn pushed(h: &mut Harness) -> Vec<(ClientId, ChangeEvent)> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let mut got = Vec::new();
        while let Ok(item) = h.pushes.try_recv() {
            got.push(item);
        }
        got
    }

    #[tokio::test]
    async fn test_update_pushes_exactly_once() {
        let mut h = harness().await;
        h.registry.subscribe("client-a", h.target).await.unwrap();

        h.repository
            .update_configuration(h.target.user_id, h.target.configuration_id, &payload("editor", 14))
            .await
            .unwrap();

        let got = pushed(&mut h).await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].0, "client-a");
        assert_eq!(got[0].1.font_size, 14);
        assert_eq!(got[0].1.target(), h.target);
    }

    #[tokio::test]
    async fn test_noop_update_pushes_nothing() {
        let mut h = harness().await;
        h.registry.subscribe("client-a", h.target).await.unwrap();

        h.repository
            .update_configuration(h.target.user_id, h.target.configuration_id, &payload("editor", 12))
            .await
            .unwrap();
        assert!(pushed(&mut h).await.is_empty());
    }

    #[tokio::test]
    async fn test_disconnected_client_stops_receiving() {
        let mut h = harness().await;
        h.registry.subscribe("client-a", h.target).await.unwrap();
        h.registry.subscribe("client-b", h.target).await.unwrap();
        assert!(h.registry.remove_client("client-a").await);

        h.repository
            .update_configuration(h.target.user_id, h.target.configuration_id, &payload("editor", 18))
            .await
            .unwrap();

        let got = pushed(&mut h).await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].0, "client-b");
    }

    #[tokio::test]
    async fn test_restore_specific_state_always_pushes() {
        let mut h = harness().await;
        let (user_id, configuration_id) = (h.target.user_id, h.target.configuration_id);
        let saved = h.repository.save_state(user_id, configuration_id).await.unwrap();
        h.registry.subscribe("client-a", h.target).await.unwrap();

        h.repository
            .restore_saved_state(user_id, configuration_id, saved.id)
            .await
            .unwrap();
        let got = pushed(&mut h).await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].1.font_size, 12);
    }

    #[tokio::test]
    async fn test_removed_configuration_drops_subscriptions() {
        let h = harness().await;
        h.registry.subscribe("client-a", h.target).await.unwrap();

        h.repository
            .remove_configuration(h.target.user_id, h.target.configuration_id)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(h.registry.list_subscriptions("client-a").await.unwrap().is_empty());
        assert!(h.registry.subscribe("client-a", h.target).await.is_err());
    }
}
