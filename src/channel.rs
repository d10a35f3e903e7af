//! Duplex confirmation channel between the engine and connected UI
//! clients. Destructive operations are gated on `acknowledge`; one-way
//! notifications (plan-ready, metadata-updated) go through `broadcast`.
//! The transport that moves [`OutboundMessage`]s to a real client and
//! feeds replies back through [`ChannelHub::resolve_ack`] is injected by
//! the embedding layer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub event: String,
    pub payload: Value,
    /// Present on requests that expect an acknowledgement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ack_id: Option<u64>,
}

/// Acknowledgement payload. `confirmed` is authoritative; the legacy
/// `response: "yes"|"no"` form is still honored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmationReply {
    #[serde(default)]
    pub confirmed: Option<bool>,
    #[serde(default)]
    pub response: Option<String>,
}

impl ConfirmationReply {
    pub fn is_confirmed(&self) -> bool {
        match self.confirmed {
            Some(value) => value,
            None => matches!(self.response.as_deref(), Some("yes")),
        }
    }
}

#[derive(Default)]
pub struct ChannelHub {
    // Registration order, so the single-user fallback picks the first
    // live channel deterministically.
    clients: Mutex<Vec<(String, mpsc::UnboundedSender<OutboundMessage>)>>,
    pending: Mutex<HashMap<u64, oneshot::Sender<Value>>>,
    next_ack_id: AtomicU64,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a client id to a fresh outbound queue, replacing any earlier
    /// binding for the same id.
    pub fn register(&self, client_id: &str) -> mpsc::UnboundedReceiver<OutboundMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        clients.retain(|(id, _)| id != client_id);
        clients.push((client_id.to_string(), tx));
        rx
    }

    pub fn unregister(&self, client_id: &str) {
        self.clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .retain(|(id, _)| id != client_id);
    }

    /// Delivers a client's acknowledgement. Returns false when nothing is
    /// waiting on that ack id (late or duplicate reply).
    pub fn resolve_ack(&self, ack_id: u64, payload: Value) -> bool {
        let sender = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&ack_id);
        match sender {
            Some(tx) => tx.send(payload).is_ok(),
            None => false,
        }
    }

    /// Sends a request to the client's channel and awaits its structured
    /// acknowledgement. An unknown client id falls back to the first live
    /// channel (single-user desktop behavior). Without a timeout the call
    /// waits indefinitely; with one, expiry surfaces as `ChannelTimeout`,
    /// distinct from `ChannelUnavailable`.
    pub async fn acknowledge(
        &self,
        client_id: &str,
        event: &str,
        payload: Value,
        timeout: Option<Duration>,
    ) -> Result<ConfirmationReply, AppError> {
        let sender = self
            .sender_for(client_id)
            .ok_or(AppError::ChannelUnavailable)?;

        let ack_id = self.next_ack_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(ack_id, tx);

        let message = OutboundMessage {
            event: event.to_string(),
            payload,
            ack_id: Some(ack_id),
        };
        if sender.send(message).is_err() {
            self.forget_ack(ack_id);
            return Err(AppError::ChannelUnavailable);
        }

        let raw = match timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(Ok(value)) => value,
                Ok(Err(_)) => return Err(AppError::ChannelUnavailable),
                Err(_) => {
                    self.forget_ack(ack_id);
                    return Err(AppError::ChannelTimeout(limit));
                }
            },
            None => rx.await.map_err(|_| AppError::ChannelUnavailable)?,
        };

        Ok(serde_json::from_value(raw).unwrap_or_default())
    }

    /// Fire-and-forget to every connected channel; never blocks on an
    /// acknowledgement. Dead channels are pruned as a side effect.
    pub fn broadcast(&self, event: &str, payload: Value) {
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        clients.retain(|(_, tx)| {
            tx.send(OutboundMessage {
                event: event.to_string(),
                payload: payload.clone(),
                ack_id: None,
            })
            .is_ok()
        });
    }

    fn sender_for(&self, client_id: &str) -> Option<mpsc::UnboundedSender<OutboundMessage>> {
        let clients = self
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        clients
            .iter()
            .find(|(id, _)| id == client_id)
            .or_else(|| clients.first())
            .map(|(_, tx)| tx.clone())
    }

    fn forget_ack(&self, ack_id: u64) {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&ack_id);
    }
}
