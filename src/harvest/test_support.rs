//! In-process resource source for unit tests.

use crate::swapi::{ClientError, RawPayload, ResourceKind, ResourceSource};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Serves canned payloads, delaying each by a per-resource latency.
///
/// Unknown resources answer with an empty object; resources marked with
/// [`StubSource::fail`] answer with a 503 status error.
#[derive(Default)]
pub struct StubSource {
    bodies: HashMap<(ResourceKind, u32), Value>,
    latency_ms: HashMap<(ResourceKind, u32), u64>,
    failing: HashSet<(ResourceKind, u32)>,
    fetches: Mutex<Vec<(ResourceKind, u32)>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StubSource {
    pub fn with(mut self, kind: ResourceKind, id: u32, body: Value) -> Self {
        self.bodies.insert((kind, id), body);
        self
    }

    pub fn delay(mut self, kind: ResourceKind, id: u32, ms: u64) -> Self {
        self.latency_ms.insert((kind, id), ms);
        self
    }

    pub fn fail(mut self, kind: ResourceKind, id: u32) -> Self {
        self.failing.insert((kind, id));
        self
    }

    pub fn fetches(&self) -> Vec<(ResourceKind, u32)> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ResourceSource for StubSource {
    async fn fetch(&self, kind: ResourceKind, id: u32) -> Result<RawPayload, ClientError> {
        self.fetches.lock().unwrap().push((kind, id));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let ms = self.latency_ms.get(&(kind, id)).copied().unwrap_or(1);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&(kind, id)) {
            return Err(ClientError::Status {
                kind,
                id,
                status: 503,
            });
        }

        Ok(match self.bodies.get(&(kind, id)) {
            Some(Value::Object(fields)) => RawPayload::new(kind, id, fields.clone()),
            _ => RawPayload::new(kind, id, Map::new()),
        })
    }
}

pub fn url(kind: ResourceKind, id: u32) -> String {
    format!("https://swapi.py4e.com/api/{kind}/{id}/")
}
