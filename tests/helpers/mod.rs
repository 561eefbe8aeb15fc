//! Shared fixtures: a scripted upstream and a sink that records commit order.

#![allow(dead_code)]

use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swapi_harvest::data::{CommitSummary, FlatRecord, MemorySink, RecordSink, SinkError};
use swapi_harvest::swapi::{ClientError, RawPayload, ResourceKind, ResourceSource};

/// Something observable the pipeline did, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Fetch(ResourceKind, u32),
    Commit(Vec<i32>),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub fn url(kind: ResourceKind, id: u32) -> String {
    format!("https://swapi.py4e.com/api/{kind}/{id}/")
}

/// A person with a name and no references.
pub fn person(name: &str) -> Value {
    json!({
        "name": name,
        "height": "150",
        "mass": "49",
        "films": [],
        "species": [],
        "starships": [],
        "vehicles": [],
    })
}

/// Scripted upstream. Unknown resources answer with the not-found sentinel.
#[derive(Default)]
pub struct Upstream {
    bodies: HashMap<(ResourceKind, u32), Value>,
    latency_ms: HashMap<(ResourceKind, u32), u64>,
    failing: HashSet<(ResourceKind, u32)>,
    log: EventLog,
    reference_in_flight: AtomicUsize,
    reference_peak: AtomicUsize,
}

impl Upstream {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn with(mut self, kind: ResourceKind, id: u32, body: Value) -> Self {
        self.bodies.insert((kind, id), body);
        self
    }

    /// Register people `range` named `Person {id}`.
    pub fn with_people(mut self, range: std::ops::RangeInclusive<u32>) -> Self {
        for id in range {
            self.bodies
                .insert((ResourceKind::People, id), person(&format!("Person {id}")));
        }
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

    /// Highest number of simultaneous non-people fetches observed.
    pub fn reference_peak(&self) -> usize {
        self.reference_peak.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ResourceSource for Upstream {
    async fn fetch(&self, kind: ResourceKind, id: u32) -> Result<RawPayload, ClientError> {
        self.log.lock().unwrap().push(Event::Fetch(kind, id));

        let is_reference = kind != ResourceKind::People;
        if is_reference {
            let now = self.reference_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.reference_peak.fetch_max(now, Ordering::SeqCst);
        }

        let ms = self.latency_ms.get(&(kind, id)).copied().unwrap_or(1);
        tokio::time::sleep(Duration::from_millis(ms)).await;

        if is_reference {
            self.reference_in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        if self.failing.contains(&(kind, id)) {
            return Err(ClientError::Status {
                kind,
                id,
                status: 502,
            });
        }

        Ok(match self.bodies.get(&(kind, id)) {
            Some(Value::Object(fields)) => RawPayload::new(kind, id, fields.clone()),
            _ => RawPayload::not_found(kind, id),
        })
    }
}

/// A [`MemorySink`] that also logs each commit.
pub struct RecordingSink {
    pub inner: MemorySink,
    log: EventLog,
}

impl RecordingSink {
    pub fn new(log: EventLog) -> Self {
        Self {
            inner: MemorySink::new(),
            log,
        }
    }
}

#[async_trait::async_trait]
impl RecordSink for RecordingSink {
    async fn commit(&mut self, records: Vec<FlatRecord>) -> Result<CommitSummary, SinkError> {
        let ids = records.iter().map(|r| r.id).collect();
        self.log.lock().unwrap().push(Event::Commit(ids));
        self.inner.commit(records).await
    }
}
