// Realtime-store adapter over the REST/SSE surface
use crate::application::store_gateway::{RecordBatch, StoreGateway};
use crate::infrastructure::sse::{SseEvent, SseParser};
use anyhow::Context;
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session handshake failed: {0}")]
    Session(String),
    #[error("store rejected request with status {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Deserialize)]
struct CreatedKey {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StreamPayload {
    path: String,
    data: serde_json::Value,
}

/// Gateway to the realtime key-value store's REST interface.
///
/// Subscriptions use the store's SSE endpoint; reads and writes never
/// happen before the session handshake has completed, and a failed
/// handshake is permanent.
pub struct RtdbStore {
    host: String,
    auth_token: Option<String>,
    client: reqwest::Client,
    session: OnceCell<Result<(), String>>,
}

impl RtdbStore {
    pub fn new(host: String, auth_token: Option<String>) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            auth_token,
            client: reqwest::Client::new(),
            session: OnceCell::new(),
        }
    }

    fn node_url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}/{}.json", self.host, path.trim_matches('/'));
        let mut query: Vec<String> = Vec::new();
        if let Some(token) = &self.auth_token {
            query.push(format!("auth={}", urlencoding::encode(token)));
        }
        for (key, value) in params {
            query.push(format!("{}={}", key, urlencoding::encode(value)));
        }
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    async fn handshake(&self) -> Result<(), String> {
        let url = self.node_url("", &[("shallow", "true".to_string())]);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("status {}", response.status()));
        }
        Ok(())
    }

    fn subscribe_raw(
        &self,
        path: &str,
        params: Vec<(&'static str, String)>,
    ) -> BoxStream<'static, SseEvent> {
        let client = self.client.clone();
        let url = self.node_url(path, &params);
        let path = path.to_string();

        Box::pin(async_stream::stream! {
            loop {
                let response = client
                    .get(&url)
                    .header("Accept", "text/event-stream")
                    .send()
                    .await;

                let response = match response {
                    Ok(r) if r.status().is_success() => r,
                    Ok(r) => {
                        tracing::warn!("Subscription to {} refused: {}", path, r.status());
                        tokio::time::sleep(RECONNECT_DELAY).await;
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!("Subscription to {} failed: {}", path, e);
                        tokio::time::sleep(RECONNECT_DELAY).await;
                        continue;
                    }
                };

                let mut parser = SseParser::new();
                let mut body = response.bytes_stream();
                while let Some(chunk) = body.next().await {
                    match chunk {
                        Ok(chunk) => {
                            for event in parser.push(&chunk) {
                                match event.event.as_str() {
                                    "keep-alive" => {}
                                    "cancel" | "auth_revoked" => {
                                        tracing::warn!(
                                            "Subscription to {} revoked by store",
                                            path
                                        );
                                        return;
                                    }
                                    _ => yield event,
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Stream for {} broke: {}", path, e);
                            break;
                        }
                    }
                }

                tracing::debug!("Stream for {} ended, reconnecting", path);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        })
    }
}

#[async_trait]
impl StoreGateway for RtdbStore {
    async fn ready(&self) -> anyhow::Result<()> {
        let outcome = self
            .session
            .get_or_init(|| async {
                let result = self.handshake().await;
                if let Err(reason) = &result {
                    tracing::error!("Session handshake failed: {}", reason);
                }
                result
            })
            .await;

        outcome
            .clone()
            .map_err(|reason| StoreError::Session(reason).into())
    }

    fn subscribe(&self, path: &str, limit: Option<usize>) -> BoxStream<'static, RecordBatch> {
        let mut params: Vec<(&'static str, String)> = Vec::new();
        if let Some(limit) = limit {
            params.push(("orderBy", "\"$key\"".to_string()));
            params.push(("limitToLast", limit.to_string()));
        }

        let events = self.subscribe_raw(path, params);
        let mut window = Window::new(limit);

        Box::pin(events.filter_map(move |event| {
            let updated = window.apply(&event);
            let batch = updated.then(|| window.batch());
            async move { batch }
        }))
    }

    fn subscribe_single(&self, path: &str) -> BoxStream<'static, serde_json::Value> {
        let events = self.subscribe_raw(path, Vec::new());
        let mut current = serde_json::Value::Null;

        Box::pin(events.filter_map(move |event| {
            let updated = apply_single(&mut current, &event);
            let value = updated.then(|| current.clone());
            async move { value }
        }))
    }

    async fn create(&self, path: &str, value: &serde_json::Value) -> anyhow::Result<String> {
        let url = self.node_url(path, &[]);
        let response = self
            .client
            .post(&url)
            .json(value)
            .send()
            .await
            .context("Failed to send create to store")?;

        if !response.status().is_success() {
            return Err(StoreError::Status(response.status()).into());
        }

        let created: CreatedKey = response
            .json()
            .await
            .context("Failed to parse create response")?;
        Ok(created.name)
    }

    async fn set(&self, path: &str, value: &serde_json::Value) -> anyhow::Result<()> {
        let url = self.node_url(path, &[]);
        let response = self
            .client
            .put(&url)
            .json(value)
            .send()
            .await
            .context("Failed to send set to store")?;

        if !response.status().is_success() {
            return Err(StoreError::Status(response.status()).into());
        }
        Ok(())
    }
}

/// The materialized last-N window of a keyed subscription, in document
/// order.
struct Window {
    entries: Vec<(String, serde_json::Value)>,
    limit: Option<usize>,
}

impl Window {
    fn new(limit: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    /// Apply one stream event; returns whether the window changed.
    fn apply(&mut self, event: &SseEvent) -> bool {
        let Some(payload) = parse_payload(event) else {
            return false;
        };

        match event.event.as_str() {
            "put" => self.apply_put(&payload.path, payload.data),
            "patch" => self.apply_patch(&payload.path, payload.data),
            other => {
                tracing::debug!("Ignoring stream event {}", other);
                return false;
            }
        }

        self.trim();
        true
    }

    fn apply_put(&mut self, path: &str, data: serde_json::Value) {
        let segments = split_path(path);
        if segments.is_empty() {
            self.entries.clear();
            if let serde_json::Value::Object(map) = data {
                self.entries.extend(map);
            }
            return;
        }

        let key = segments[0];
        if segments.len() == 1 {
            if data.is_null() {
                self.entries.retain(|(k, _)| k != key);
            } else {
                self.upsert(key, data);
            }
        } else if let Some((_, value)) = self.entries.iter_mut().find(|(k, _)| k == key) {
            set_at_path(value, &segments[1..], data);
        }
    }

    fn apply_patch(&mut self, path: &str, data: serde_json::Value) {
        let serde_json::Value::Object(map) = data else {
            return;
        };
        let segments = split_path(path);
        if segments.is_empty() {
            for (key, value) in map {
                self.upsert(&key, value);
            }
        } else if let Some((_, value)) =
            self.entries.iter_mut().find(|(k, _)| k == segments[0])
        {
            for (child, child_value) in map {
                let mut child_segments: Vec<&str> = segments[1..].to_vec();
                child_segments.push(&child);
                set_at_path(value, &child_segments, child_value);
            }
        }
    }

    fn upsert(&mut self, key: &str, data: serde_json::Value) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, value)) => *value = data,
            None => self.entries.push((key.to_string(), data)),
        }
    }

    fn trim(&mut self) {
        if let Some(limit) = self.limit {
            while self.entries.len() > limit {
                self.entries.remove(0);
            }
        }
    }

    fn batch(&self) -> RecordBatch {
        self.entries.clone()
    }
}

/// Apply one stream event to a single-record subscription; returns
/// whether the record changed.
fn apply_single(current: &mut serde_json::Value, event: &SseEvent) -> bool {
    let Some(payload) = parse_payload(event) else {
        return false;
    };

    match event.event.as_str() {
        "put" => {
            set_at_path(current, &split_path(&payload.path), payload.data);
            true
        }
        "patch" => {
            let serde_json::Value::Object(map) = payload.data else {
                return false;
            };
            let segments = split_path(&payload.path);
            for (child, child_value) in map {
                let mut child_segments: Vec<&str> = segments.clone();
                child_segments.push(&child);
                set_at_path(current, &child_segments, child_value);
            }
            true
        }
        _ => false,
    }
}

fn parse_payload(event: &SseEvent) -> Option<StreamPayload> {
    match serde_json::from_str(&event.data) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::warn!("Unparseable {} payload: {}", event.event, e);
            None
        }
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Write `data` at a nested location, creating intermediate objects.
fn set_at_path(root: &mut serde_json::Value, segments: &[&str], data: serde_json::Value) {
    let Some((first, rest)) = segments.split_first() else {
        *root = data;
        return;
    };

    if !root.is_object() {
        *root = serde_json::Value::Object(serde_json::Map::new());
    }
    let serde_json::Value::Object(map) = root else {
        return;
    };

    if rest.is_empty() && data.is_null() {
        map.remove(*first);
        return;
    }

    let child = map
        .entry(first.to_string())
        .or_insert(serde_json::Value::Null);
    set_at_path(child, rest, data);
}
