//! Event Correlator: arma una suscripción push antes del trigger y espera,
//! con deadline, un evento que cumpla el predicado.

mod predicate;
mod subscription;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde_json::Value;
use tokio::time::Instant;

pub use predicate::EventPredicate;
pub use subscription::EventSubscription;

use crate::constants::CORRELATION_TIMEOUT_MESSAGE;
use crate::errors::ProbeError;
use crate::step::{Captured, StepOutcome};
use crate::transport::PushChannel;

pub struct EventCorrelator {
    channel: Arc<dyn PushChannel>,
}

impl EventCorrelator {
    pub fn new(channel: Arc<dyn PushChannel>) -> Self {
        Self { channel }
    }

    /// Abre la suscripción y lanza el loop de recepción. Devuelve cuando el
    /// canal ya registró el tópico; el deadline empieza a correr aquí.
    pub async fn arm(&self,
                     topic: &str,
                     predicate: EventPredicate,
                     deadline: Duration,
                     token: Option<&str>)
                     -> Result<EventSubscription, ProbeError> {
        let subscription = self.channel.subscribe(topic, token).await?;
        debug!("armed {topic} ({}ms)", deadline.as_millis());
        Ok(EventSubscription::spawn(subscription,
                                    predicate,
                                    Instant::now() + deadline,
                                    deadline.as_millis() as u64))
    }

    /// Punto de suspensión: espera el match o el deadline y cierra la
    /// suscripción en ambos casos.
    pub async fn await_match(&self, step: &str, mut subscription: EventSubscription) -> StepOutcome {
        let started = Instant::now();
        let result = match subscription.matched.take() {
            Some(rx) => match tokio::time::timeout_at(subscription.deadline, rx).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(ProbeError::Internal(format!("receive loop on {} ended without result",
                                                               subscription.topic))),
                Err(_) => Err(ProbeError::CorrelationTimeout { topic: subscription.topic.clone(),
                                                               deadline_ms: subscription.deadline_ms }),
            },
            None => Err(ProbeError::Internal(format!("subscription on {} was already awaited", subscription.topic))),
        };
        subscription.close().await;

        let outcome = match result {
            Ok(payload) => {
                let mut captured = Captured::new();
                if let Value::Object(map) = &payload {
                    for (k, v) in map {
                        captured.insert(k.clone(), v.clone());
                    }
                }
                captured.insert("payload".into(), payload);
                StepOutcome::pass(step, captured, format!("event received on {}", subscription.topic))
            }
            Err(e @ ProbeError::CorrelationTimeout { .. }) => {
                warn!("{step}: {e}");
                StepOutcome::fail_with(step, e, CORRELATION_TIMEOUT_MESSAGE)
            }
            Err(e) => StepOutcome::fail(step, e),
        };
        outcome.with_elapsed(started.elapsed())
    }
}
