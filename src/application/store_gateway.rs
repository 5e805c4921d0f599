// Gateway trait for the realtime key-value store
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::de::DeserializeOwned;

/// One delivery from a keyed subscription: (key, value) pairs in the
/// store's document order. Keys are opaque; only iteration order is
/// semantically meaningful.
pub type RecordBatch = Vec<(String, serde_json::Value)>;

#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Complete the auth/session handshake. Must resolve before the
    /// first subscribe or write; a failure is permanent.
    async fn ready(&self) -> anyhow::Result<()>;

    /// Subscribe to a keyed collection, optionally limited to the last
    /// `limit` records. Each event yields the full current window.
    fn subscribe(&self, path: &str, limit: Option<usize>) -> BoxStream<'static, RecordBatch>;

    /// Subscribe to a single record, yielding its current value on each
    /// change.
    fn subscribe_single(&self, path: &str) -> BoxStream<'static, serde_json::Value>;

    /// Append a value under a generated key, returning the key.
    async fn create(&self, path: &str, value: &serde_json::Value) -> anyhow::Result<String>;

    /// Replace the value at a path.
    async fn set(&self, path: &str, value: &serde_json::Value) -> anyhow::Result<()>;
}

/// Decode a record leniently: malformed records degrade to the type's
/// default value instead of surfacing an error.
pub fn decode_or_default<T: DeserializeOwned + Default>(value: serde_json::Value) -> T {
    match serde_json::from_value(value) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!("Malformed record, using defaults: {}", e);
            T::default()
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use futures::StreamExt;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    /// Channel-backed gateway for service tests: writes are recorded,
    /// subscriptions are fed from test-held senders.
    pub(crate) struct MockStore {
        writes: Mutex<Vec<(String, serde_json::Value)>>,
        batch_sources: Mutex<HashMap<String, mpsc::UnboundedReceiver<RecordBatch>>>,
        single_sources: Mutex<HashMap<String, mpsc::UnboundedReceiver<serde_json::Value>>>,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self {
                writes: Mutex::new(Vec::new()),
                batch_sources: Mutex::new(HashMap::new()),
                single_sources: Mutex::new(HashMap::new()),
            }
        }

        pub fn writes(&self) -> Vec<(String, serde_json::Value)> {
            self.writes.lock().unwrap().clone()
        }

        pub fn batch_source(&self, path: &str) -> mpsc::UnboundedSender<RecordBatch> {
            let (tx, rx) = mpsc::unbounded_channel();
            self.batch_sources
                .lock()
                .unwrap()
                .insert(path.to_string(), rx);
            tx
        }

        pub fn single_source(&self, path: &str) -> mpsc::UnboundedSender<serde_json::Value> {
            let (tx, rx) = mpsc::unbounded_channel();
            self.single_sources
                .lock()
                .unwrap()
                .insert(path.to_string(), rx);
            tx
        }
    }

    #[async_trait]
    impl StoreGateway for MockStore {
        async fn ready(&self) -> anyhow::Result<()> {
            Ok(())
        }

        fn subscribe(
            &self,
            path: &str,
            _limit: Option<usize>,
        ) -> BoxStream<'static, RecordBatch> {
            match self.batch_sources.lock().unwrap().remove(path) {
                Some(rx) => UnboundedReceiverStream::new(rx).boxed(),
                None => futures::stream::pending().boxed(),
            }
        }

        fn subscribe_single(&self, path: &str) -> BoxStream<'static, serde_json::Value> {
            match self.single_sources.lock().unwrap().remove(path) {
                Some(rx) => UnboundedReceiverStream::new(rx).boxed(),
                None => futures::stream::pending().boxed(),
            }
        }

        async fn create(
            &self,
            path: &str,
            value: &serde_json::Value,
        ) -> anyhow::Result<String> {
            let mut writes = self.writes.lock().unwrap();
            writes.push((path.to_string(), value.clone()));
            Ok(format!("-MOCK{}", writes.len()))
        }

        async fn set(&self, path: &str, value: &serde_json::Value) -> anyhow::Result<()> {
            self.writes
                .lock()
                .unwrap()
                .push((path.to_string(), value.clone()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reading::Reading;

    #[test]
    fn test_decode_or_default_on_wrong_shape() {
        let reading: Reading = decode_or_default(serde_json::json!("not an object"));
        assert_eq!(reading.ph, 0.0);
        assert!(reading.timestamp.is_none());
    }

    #[test]
    fn test_decode_passes_through_valid_records() {
        let reading: Reading = decode_or_default(serde_json::json!({
            "ph": 7.1, "temperature": 23.5, "tds": 210.0, "turbidity": 1.0,
            "timestamp": 1700000000000_i64
        }));
        assert_eq!(reading.temperature, 23.5);
        assert_eq!(reading.timestamp, Some(1_700_000_000_000));
    }
}
