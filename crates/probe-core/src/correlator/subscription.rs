//! Suscripción armada y su loop de recepción en background.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::debug;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::EventPredicate;
use crate::errors::ProbeError;
use crate::transport::PushSubscription;

pub(crate) type MatchResult = Result<Value, ProbeError>;

/// Suscripción con deadline. El loop de recepción corre como task propia y
/// entrega el primer payload que cumple el predicado por un `oneshot`.
///
/// El loop termina (y desuscribe) al encontrar el evento, al vencer el
/// deadline o cuando el receptor se descarta.
#[derive(Debug)]
pub struct EventSubscription {
    pub(crate) topic: String,
    pub(crate) deadline: Instant,
    pub(crate) deadline_ms: u64,
    pub(crate) matched: Option<oneshot::Receiver<MatchResult>>,
    task: Option<JoinHandle<()>>,
    received: Arc<AtomicUsize>,
}

impl EventSubscription {
    pub(crate) fn spawn(subscription: PushSubscription,
                        predicate: EventPredicate,
                        deadline: Instant,
                        deadline_ms: u64)
                        -> Self {
        let (tx, rx) = oneshot::channel();
        let received = Arc::new(AtomicUsize::new(0));
        let topic = subscription.topic().to_string();
        let task = tokio::spawn(receive_loop(subscription, predicate, deadline, deadline_ms, tx, Arc::clone(&received)));
        Self { topic,
               deadline,
               deadline_ms,
               matched: Some(rx),
               task: Some(task),
               received }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Payloads recibidos (coincidan o no).
    pub fn received_count(&self) -> usize {
        self.received.load(Ordering::SeqCst)
    }

    /// `true` cuando el loop ya terminó y la suscripción fue liberada.
    pub fn is_closed(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }

    /// Cierra la suscripción y espera a que el loop termine.
    pub async fn close(&mut self) {
        self.matched.take();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

enum Wake {
    Event(Option<Value>),
    Deadline,
    Abandoned,
}

async fn receive_loop(mut subscription: PushSubscription,
                      predicate: EventPredicate,
                      deadline: Instant,
                      deadline_ms: u64,
                      mut tx: oneshot::Sender<MatchResult>,
                      received: Arc<AtomicUsize>) {
    let topic = subscription.topic().to_string();
    loop {
        let wake = tokio::select! {
            _ = tokio::time::sleep_until(deadline) => Wake::Deadline,
            _ = tx.closed() => Wake::Abandoned,
            event = subscription.recv() => Wake::Event(event),
        };
        match wake {
            Wake::Event(Some(payload)) => {
                received.fetch_add(1, Ordering::SeqCst);
                if predicate.matches(&payload) {
                    debug!("match on {topic}");
                    let _ = tx.send(Ok(payload));
                    break;
                }
            }
            Wake::Event(None) => {
                let _ = tx.send(Err(ProbeError::Transport(format!("push channel closed on {topic}"))));
                break;
            }
            Wake::Deadline => {
                let _ = tx.send(Err(ProbeError::CorrelationTimeout { topic: topic.clone(),
                                                                      deadline_ms }));
                break;
            }
            Wake::Abandoned => break,
        }
    }
    drop(subscription);
    debug!("unsubscribed from {topic}");
}
