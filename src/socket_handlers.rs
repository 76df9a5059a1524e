// src/socket_handlers.rs
use super::{
    registry::{RegistryError, SubscribeOutcome, UnsubscribeOutcome},
    types::{SubscriptionAck, SubscriptionPayload, Target},
    ServerState,
};
use socketioxide::extract::{SocketRef, TryData};
use tracing::{info, warn};

pub const SUBSCRIBE_EVENT: &str = "subscribe_configuration";
pub const UNSUBSCRIBE_EVENT: &str = "unsubscribe_configuration";
pub const ACK_EVENT: &str = "subscription_update";

const SUBSCRIBE: &str = "subscribe";
const UNSUBSCRIBE: &str = "unsubscribe";

pub async fn on_socket_connect(s: SocketRef, state: ServerState) {
    info!("🔌 [Socket.IO] Client connected: {}", s.id);
    // Private room, so pushes can address this socket by id.
    s.join(s.id.to_string());
    register_subscribe_handler(&s, state.clone());
    register_unsubscribe_handler(&s, state.clone());
    register_disconnect_handler(&s, state);
}

/// `wasPreviouslySubscribed` is true only if the client already held the subscription.
pub fn subscribe_ack(result: &Result<SubscribeOutcome, RegistryError>, payload: SubscriptionPayload) -> SubscriptionAck {
    match result {
        Ok(outcome) => SubscriptionAck::completed(SUBSCRIBE, *outcome == SubscribeOutcome::AlreadySubscribed, payload),
        Err(e) => SubscriptionAck::failed(SUBSCRIBE, e.to_string()),
    }
}

/// `wasPreviouslySubscribed` is true only if a subscription was actually removed.
pub fn unsubscribe_ack(outcome: UnsubscribeOutcome, payload: SubscriptionPayload) -> SubscriptionAck {
    SubscriptionAck::completed(UNSUBSCRIBE, outcome == UnsubscribeOutcome::Unsubscribed, payload)
}

pub async fn handle_subscribe(state: &ServerState, client_id: &str, payload: SubscriptionPayload) -> SubscriptionAck {
    let target = Target::new(payload.user_id, payload.configuration_id);
    info!("🔔 [SUB] Client {} -> {:?}", client_id, target);
    let result = state.registry.subscribe(client_id, target).await;
    if let Err(e) = &result {
        warn!("⚠️ [SUB] Client {} could not subscribe: {}", client_id, e);
    }
    subscribe_ack(&result, payload)
}

pub async fn handle_unsubscribe(state: &ServerState, client_id: &str, payload: SubscriptionPayload) -> SubscriptionAck {
    let target = Target::new(payload.user_id, payload.configuration_id);
    let outcome = state.registry.unsubscribe(client_id, target).await;
    info!("🔕 [UNSUB] Client {} -x- {:?} ({:?})", client_id, target, outcome);
    unsubscribe_ack(outcome, payload)
}

pub async fn handle_disconnect(state: &ServerState, client_id: &str) -> bool {
    let was_registered = state.registry.remove_client(client_id).await;
    info!(
        "🔌 [Socket.IO] Client disconnected: {} (was registered: {})",
        client_id, was_registered
    );
    was_registered
}

fn send_ack(s: &SocketRef, ack: &SubscriptionAck) {
    if let Err(e) = s.emit(ACK_EVENT, ack) {
        warn!("⚠️ [Socket.IO] Failed to ack {}: {}", s.id, e);
    }
}

fn register_subscribe_handler(socket: &SocketRef, state: ServerState) {
    socket.on(SUBSCRIBE_EVENT, move |s: SocketRef, TryData(payload): TryData<SubscriptionPayload>| {
        let state = state.clone();
        async move {
            let ack = match payload {
                Ok(payload) => handle_subscribe(&state, &s.id.to_string(), payload).await,
                Err(e) => {
                    warn!("⚠️ [SUB] Malformed payload from {}: {}", s.id, e);
                    SubscriptionAck::failed(SUBSCRIBE, format!("Invalid subscription payload: {e}"))
                }
            };
            send_ack(&s, &ack);
        }
    });
}

fn register_unsubscribe_handler(socket: &SocketRef, state: ServerState) {
    socket.on(UNSUBSCRIBE_EVENT, move |s: SocketRef, TryData(payload): TryData<SubscriptionPayload>| {
        let state = state.clone();
        async move {
            let ack = match payload {
                Ok(payload) => handle_unsubscribe(&state, &s.id.to_string(), payload).await,
                Err(e) => {
                    warn!("⚠️ [UNSUB] Malformed payload from {}: {}", s.id, e);
                    SubscriptionAck::failed(UNSUBSCRIBE, format!("Invalid subscription payload: {e}"))
                }
            };
            send_ack(&s, &ack);
        }
    });
}

fn register_disconnect_handler(socket: &SocketRef, state: ServerState) {
    socket.on_disconnect(move |s: SocketRef| {
        let state = state.clone();
        async move {
            handle_disconnect(&state, &s.id.to_string()).await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assemble_state, config::Config, connect_database,
        types::{ConfigurationPayload, TextOptions, UserPayload},
    };
    use serde_json::{json, Value};
    use socketioxide::SocketIo;
    use std::sync::Arc;

    const PAYLOAD: SubscriptionPayload = SubscriptionPayload { user_id: 1, configuration_id: 10 };

    fn to_json(ack: &SubscriptionAck) -> Value {
        serde_json::to_value(ack).unwrap()
    }

    async fn state_with_configuration() -> (ServerState, SubscriptionPayload) {
        let pool = connect_database("sqlite::memory:", 1).await.unwrap();
        let (_layer, io) = SocketIo::new_layer();
        let state = assemble_state(Arc::new(Config::new()), io, pool);
        let user = state
            .repository
            .add_user(&UserPayload { username: "socket".into(), name: String::new() })
            .await
            .unwrap();
        let configuration = state
            .repository
            .create_configuration(
                user.id,
                &ConfigurationPayload {
                    configuration_name: "editor".into(),
                    text_options: TextOptions::default(),
                },
            )
            .await
            .unwrap();
        let payload = SubscriptionPayload {
            user_id: user.id,
            configuration_id: configuration.id,
        };
        (state, payload)
    }

    #[test]
    fn subscribe_ack_reports_previous_subscription() {
        let fresh = to_json(&subscribe_ack(&Ok(SubscribeOutcome::Subscribed), PAYLOAD));
        assert_eq!(
            fresh,
            json!({
                "success": true,
                "action": "subscribe",
                "wasPreviouslySubscribed": false,
                "userId": 1,
                "configurationId": 10
            })
        );

        let again = to_json(&subscribe_ack(&Ok(SubscribeOutcome::AlreadySubscribed), PAYLOAD));
        assert_eq!(again["wasPreviouslySubscribed"], true);
    }

    #[test]
    fn subscribe_ack_carries_the_error() {
        let err = RegistryError::TargetNotFound { user_id: 1, configuration_id: 10 };
        let ack = to_json(&subscribe_ack(&Err(err), PAYLOAD));
        assert_eq!(ack["success"], false);
        assert_eq!(ack["action"], "subscribe");
        assert!(ack["error"].as_str().unwrap().contains("does not exist"));
        assert!(ack.get("wasPreviouslySubscribed").is_none());
    }

    #[test]
    fn unsubscribe_ack_reports_removal() {
        let removed = to_json(&unsubscribe_ack(UnsubscribeOutcome::Unsubscribed, PAYLOAD));
        assert_eq!(removed["action"], "unsubscribe");
        assert_eq!(removed["wasPreviouslySubscribed"], true);

        let absent = to_json(&unsubscribe_ack(UnsubscribeOutcome::WasNotSubscribed, PAYLOAD));
        assert_eq!(absent["success"], true);
        assert_eq!(absent["wasPreviouslySubscribed"], false);
    }

    #[test]
    fn malformed_payload_is_rejected_by_deserialization() {
        let parsed = serde_json::from_value::<SubscriptionPayload>(json!({ "userId": "abc" }));
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_subscribe_unsubscribe_disconnect_cycle() {
        let (state, payload) = state_with_configuration().await;

        let first = to_json(&handle_subscribe(&state, "sid-1", payload).await);
        assert_eq!(first["success"], true);
        assert_eq!(first["wasPreviouslySubscribed"], false);

        let second = to_json(&handle_subscribe(&state, "sid-1", payload).await);
        assert_eq!(second["wasPreviouslySubscribed"], true);

        let missing = SubscriptionPayload { user_id: payload.user_id, configuration_id: 999 };
        let failed = to_json(&handle_subscribe(&state, "sid-1", missing).await);
        assert_eq!(failed["success"], false);

        let left = to_json(&handle_unsubscribe(&state, "sid-1", payload).await);
        assert_eq!(left["wasPreviouslySubscribed"], true);
        let left_again = to_json(&handle_unsubscribe(&state, "sid-1", payload).await);
        assert_eq!(left_again["wasPreviouslySubscribed"], false);

        handle_subscribe(&state, "sid-2", payload).await;
        assert!(handle_disconnect(&state, "sid-2").await);
        assert!(!handle_disconnect(&state, "sid-2").await);
        assert_eq!(state.registry.list_clients().await, vec!["sid-1".to_string()]);
    }
}
