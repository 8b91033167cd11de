//! Transportes en memoria: servicio con rutas programadas, broker push con
//! fan-out por tópico y superficie cliente con respuestas fijas.
//!
//! El broker no guarda historial: un evento publicado antes de suscribirse
//! se pierde, igual que en un canal push real.
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::{ClientSurface, PushChannel, PushSubscription, ServiceClient, ServiceRequest, ServiceResponse, Verb};
use crate::constants::SUBSCRIPTION_BUFFER;
use crate::errors::ProbeError;

type Handler = Arc<dyn Fn(&ServiceRequest) -> Result<ServiceResponse, ProbeError> + Send + Sync>;

struct Route {
    verb: Verb,
    pattern: Vec<String>,
    handler: Handler,
}

impl Route {
    /// `*` acepta cualquier segmento.
    fn matches(&self, request: &ServiceRequest) -> bool {
        let segments = request.path_segments();
        self.verb == request.verb
        && self.pattern.len() == segments.len()
        && self.pattern.iter().zip(segments).all(|(p, s)| p == "*" || p == s)
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Servicio request/response programable. Registra cada llamada recibida.
/// Un request sin ruta registrada responde 404.
#[derive(Default)]
pub struct InMemoryService {
    routes: RwLock<Vec<Route>>,
    calls: Mutex<Vec<ServiceRequest>>,
}

impl InMemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una ruta. La primera ruta que coincide gana.
    pub fn route<F>(&self, verb: Verb, pattern: &str, handler: F) -> &Self
        where F: Fn(&ServiceRequest) -> Result<ServiceResponse, ProbeError> + Send + Sync + 'static
    {
        let pattern = pattern.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect();
        let mut routes = self.routes.write().unwrap_or_else(|p| p.into_inner());
        routes.push(Route { verb,
                            pattern,
                            handler: Arc::new(handler) });
        self
    }

    /// Ruta con respuesta fija.
    pub fn respond(&self, verb: Verb, pattern: &str, status: u16, body: Value) -> &Self {
        self.route(verb, pattern, move |_| Ok(ServiceResponse::new(status, body.clone())))
    }

    pub fn calls(&self) -> Vec<ServiceRequest> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Llamadas cuyo path empieza con `prefix`.
    pub fn calls_to(&self, prefix: &str) -> usize {
        lock(&self.calls).iter().filter(|c| c.path.starts_with(prefix)).count()
    }
}

#[async_trait]
impl ServiceClient for InMemoryService {
    async fn send(&self, request: ServiceRequest) -> Result<ServiceResponse, ProbeError> {
        lock(&self.calls).push(request.clone());
        let handler = {
            let routes = self.routes.read().unwrap_or_else(|p| p.into_inner());
            routes.iter().find(|r| r.matches(&request)).map(|r| Arc::clone(&r.handler))
        };
        match handler {
            Some(h) => h(&request),
            None => Ok(ServiceResponse::new(404, json!({"error": "Not Found", "path": request.path}))),
        }
    }
}

#[derive(Default)]
struct BrokerInner {
    topics: DashMap<String, Vec<(u64, mpsc::Sender<Value>)>>,
    next_id: AtomicU64,
}

/// Broker push en memoria. Clonable: los clones comparten tópicos.
#[derive(Clone, Default)]
pub struct InMemoryPushBroker {
    inner: Arc<BrokerInner>,
}

impl InMemoryPushBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publica en todos los suscriptores actuales del tópico. Devuelve cuántos
    /// lo recibieron.
    pub fn publish(&self, topic: &str, payload: Value) -> usize {
        match self.inner.topics.get(topic) {
            Some(subs) => subs.iter().filter(|(_, tx)| tx.try_send(payload.clone()).is_ok()).count(),
            None => 0,
        }
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.topics.get(topic).map(|s| s.len()).unwrap_or(0)
    }

    pub fn total_subscribers(&self) -> usize {
        self.inner.topics.iter().map(|e| e.value().len()).sum()
    }
}

#[async_trait]
impl PushChannel for InMemoryPushBroker {
    async fn subscribe(&self, topic: &str, _token: Option<&str>) -> Result<PushSubscription, ProbeError> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.topics.entry(topic.to_string()).or_default().push((id, tx));

        let inner = Arc::clone(&self.inner);
        let owned_topic = topic.to_string();
        Ok(PushSubscription::new(topic, rx).with_on_close(move || {
                                               if let Some(mut subs) = inner.topics.get_mut(&owned_topic) {
                                                   subs.retain(|(sid, _)| *sid != id);
                                               }
                                               inner.topics.remove_if(&owned_topic, |_, subs| subs.is_empty());
                                           }))
    }
}

/// Superficie cliente con resultados fijos por acción.
pub struct InMemorySurface {
    name: String,
    actions: DashMap<String, Result<Value, ProbeError>>,
    calls: AtomicUsize,
}

impl InMemorySurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               actions: DashMap::new(),
               calls: AtomicUsize::new(0) }
    }

    pub fn with_action(self, action: &str, result: Result<Value, ProbeError>) -> Self {
        self.actions.insert(action.to_string(), result);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientSurface for InMemorySurface {
    fn name(&self) -> &str {
        &self.name
    }

    async fn perform(&self, action: &str, _params: &Value) -> Result<Value, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.actions
            .get(action)
            .map(|r| r.value().clone())
            .unwrap_or_else(|| Err(ProbeError::Transport(format!("surface '{}' has no action '{action}'", self.name))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wildcard_routes_and_404_fallback() {
        let svc = InMemoryService::new();
        svc.respond(Verb::Get, "/api/chats/*/messages", 200, json!([]));
        let ok = svc.send(ServiceRequest::get("/api/chats/7/messages")).await.unwrap();
        assert_eq!(ok.status, 200);
        let missing = svc.send(ServiceRequest::get("/api/chats/7")).await.unwrap();
        assert_eq!(missing.status, 404);
        assert_eq!(svc.call_count(), 2);
        assert_eq!(svc.calls_to("/api/chats"), 2);
    }

    #[tokio::test]
    async fn broker_has_no_replay_and_unsubscribes_on_drop() {
        let broker = InMemoryPushBroker::new();
        assert_eq!(broker.publish("/topic/a", json!(1)), 0);

        let mut sub = broker.subscribe("/topic/a", None).await.unwrap();
        assert_eq!(broker.subscriber_count("/topic/a"), 1);
        assert_eq!(broker.publish("/topic/a", json!(2)), 1);
        assert_eq!(sub.recv().await, Some(json!(2)));

        drop(sub);
        assert_eq!(broker.subscriber_count("/topic/a"), 0);
        assert_eq!(broker.total_subscribers(), 0);
    }
}
