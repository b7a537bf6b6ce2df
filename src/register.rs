use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::models::{decode_visitors, encode_visitors, visitor::timestamp, VisitorRecord};
use crate::store::KvStore;

/// Store key the visitor list is persisted under.
pub const VISITORS_KEY: &str = "visitors";

/// Ordered, append-only list of visitor records.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VisitorRegister {
    visitors: Vec<VisitorRecord>,
}

impl VisitorRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_visitors(visitors: Vec<VisitorRecord>) -> Self {
        Self { visitors }
    }

    pub fn visitors(&self) -> &[VisitorRecord] {
        &self.visitors
    }

    pub fn find(&self, id: &str) -> Option<&VisitorRecord> {
        self.visitors.iter().find(|v| v.id == id)
    }

    /// Append a new visitor. Returns `None` without touching the list when the
    /// trimmed name or purpose is empty.
    pub fn register_visitor(&mut self, name: &str, purpose: &str) -> Option<&VisitorRecord> {
        let name = name.trim();
        let purpose = purpose.trim();
        if name.is_empty() || purpose.is_empty() {
            return None;
        }

        self.visitors
            .push(VisitorRecord::new(name.to_string(), purpose.to_string()));
        self.visitors.last()
    }

    /// Stamp the exit time on the visitor with `id`. Returns `false` when the id
    /// is unknown or the visitor has already exited.
    pub fn record_exit(&mut self, id: &str) -> bool {
        match self.visitors.iter_mut().find(|v| v.id == id) {
            Some(visitor) if !visitor.has_exited() => {
                visitor.exit_time = Some(timestamp());
                true
            }
            _ => false,
        }
    }

    // Undo a registration whose write failed.
    fn unregister_last(&mut self) {
        self.visitors.pop();
    }

    // Undo an exit whose write failed.
    fn reopen(&mut self, id: &str) {
        if let Some(visitor) = self.visitors.iter_mut().find(|v| v.id == id) {
            visitor.exit_time = None;
        }
    }
}

/// The process-wide register together with its durable mirror.
///
/// Every mutation and the write that mirrors it happen under one lock, and a
/// mutation whose write fails is undone, so a reader never sees in-memory
/// state that the store is behind on.
#[derive(Clone)]
pub struct SharedRegister {
    inner: Arc<Mutex<VisitorRegister>>,
    store: KvStore,
}

impl SharedRegister {
    /// Build the register from whatever the store holds. Missing or malformed
    /// data starts an empty register.
    pub async fn load(store: KvStore) -> Result<Self, sqlx::Error> {
        let visitors = match store.get(VISITORS_KEY).await? {
            Some(raw) => match String::from_utf8(raw) {
                Ok(raw) => decode_visitors(&raw),
                Err(e) => {
                    tracing::warn!("Discarding visitor payload that is not UTF-8: {e}");
                    Vec::new()
                }
            },
            None => {
                tracing::debug!("No persisted visitors, starting empty");
                Vec::new()
            }
        };
        let register = VisitorRegister::from_visitors(visitors);

        tracing::info!("Loaded {} visitors", register.visitors().len());

        Ok(Self {
            inner: Arc::new(Mutex::new(register)),
            store,
        })
    }

    pub async fn visitors(&self) -> Vec<VisitorRecord> {
        self.inner.lock().await.visitors().to_vec()
    }

    pub async fn register_visitor(
        &self,
        name: &str,
        purpose: &str,
    ) -> Result<Option<VisitorRecord>, AppError> {
        let mut register = self.inner.lock().await;

        let Some(visitor) = register.register_visitor(name, purpose).cloned() else {
            tracing::debug!("Ignoring registration with empty name or purpose");
            return Ok(None);
        };

        if let Err(e) = self.persist(&register).await {
            register.unregister_last();
            return Err(e);
        }
        tracing::info!("Registered visitor {}", visitor.id);
        Ok(Some(visitor))
    }

    /// Record an exit and return the visitor as it now stands, or `None` when
    /// no visitor has this id.
    pub async fn record_exit(&self, id: &str) -> Result<Option<VisitorRecord>, AppError> {
        let mut register = self.inner.lock().await;

        if register.record_exit(id) {
            if let Err(e) = self.persist(&register).await {
                register.reopen(id);
                return Err(e);
            }
            tracing::info!("Recorded exit for visitor {id}");
        } else {
            tracing::debug!("Exit for visitor {id} ignored");
        }

        Ok(register.find(id).cloned())
    }

    async fn persist(&self, register: &VisitorRegister) -> Result<(), AppError> {
        let payload = encode_visitors(register.visitors())?;
        self.store.set(VISITORS_KEY, &payload).await?;
        Ok(())
    }
}
