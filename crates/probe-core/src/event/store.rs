use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::{RunEvent, RunEventKind};

/// Almacenamiento de eventos append-only.
pub trait EventStore {
    /// Agrega un evento a partir de su kind y devuelve el evento completo (con seq y ts).
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent;
    /// Lista eventos de una ejecución (orden ascendente por seq).
    fn list(&self, run_id: Uuid) -> Vec<RunEvent>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    inner: HashMap<Uuid, Vec<RunEvent>>,
}

impl InMemoryEventStore {
    pub fn run_ids(&self) -> Vec<Uuid> {
        self.inner.keys().copied().collect()
    }
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: RunEventKind) -> RunEvent {
        let events = self.inner.entry(run_id).or_default();
        let ev = RunEvent { seq: events.len() as u64,
                            run_id,
                            kind,
                            ts: Utc::now() };
        events.push(ev.clone());
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.inner.get(&run_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_are_per_run() {
        let mut store = InMemoryEventStore::default();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store.append_kind(a, RunEventKind::ScenarioCompleted { passed: true });
        let ev = store.append_kind(b, RunEventKind::ScenarioCompleted { passed: false });
        assert_eq!(ev.seq, 0);
        store.append_kind(a, RunEventKind::ScenarioAborted { step: "health".into() });
        assert_eq!(store.list(a).iter().map(|e| e.seq).collect::<Vec<_>>(), vec![0, 1]);
        assert!(store.list(Uuid::new_v4()).is_empty());
        assert_eq!(store.run_ids().len(), 2);
    }
}
