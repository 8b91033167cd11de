//! Journal de ejecución: tipos de evento y trait EventStore.

mod store;
mod types;

pub use store::{EventStore, InMemoryEventStore};
pub use types::{RunEvent, RunEventKind};
