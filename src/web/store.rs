//! In-memory session store that drops expired sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower_sessions::SessionStore;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, ExpiredDeletion};
use tracing::{debug, error};

#[derive(Clone, Debug, Default)]
pub(crate) struct SweepingStore {
    records: Arc<Mutex<HashMap<Id, Record>>>,
}

impl SweepingStore {
    /// Removes expired records, returning how many went.
    async fn sweep(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| record.expiry_date > now);
        before - records.len()
    }

    /// Sweeps every `period` until the runtime shuts down.
    pub(crate) async fn sweep_every(self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        // the first tick is immediate
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(err) = self.delete_expired().await {
                error!("Failed to sweep expired sessions: {}", err);
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn largest_record(&self) -> usize {
        self.records
            .lock()
            .await
            .values()
            .filter_map(|record| serde_json::to_vec(&record.data).ok())
            .map(|data| data.len())
            .max()
            .unwrap_or_default()
    }
}

#[async_trait]
impl SessionStore for SweepingStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        while records.contains_key(&record.id) {
            record.id = Id::default();
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.lock().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let now = OffsetDateTime::now_utc();
        let mut records = self.records.lock().await;
        match records.get(session_id) {
            Some(record) if record.expiry_date > now => Ok(Some(record.clone())),
            Some(_) => {
                records.remove(session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.lock().await.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for SweepingStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let removed = self.sweep().await;
        if removed > 0 {
            debug!("Removed {} expired session(s)", removed);
        }
        Ok(())
    }
}
