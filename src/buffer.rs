//! Bounded buffer of interaction events.
//!
//! Events are formatted as `X<instrument>Y<key>` on arrival. Once the buffer
//! holds [`BATCH_CAPACITY`] entries it hands the whole batch back to the
//! caller and starts over empty, before anything is sent. A batch that then
//! fails to send is gone; there is no requeue.

use serde::{Deserialize, Serialize};

/// Number of events per pushed batch.
pub const BATCH_CAPACITY: usize = 5;

/// Separator between events in a batch.
pub const EVENT_SEPARATOR: &str = "-";

/// Form field carrying the joined batch.
pub const BATCH_FIELD: &str = "UserTouchData";

/// A single user interaction: which instrument, which key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub instrument: i64,
    pub key: i64,
}

impl EventRecord {
    /// Create a new event record.
    pub fn new(instrument: i64, key: i64) -> Self {
        Self { instrument, key }
    }

    /// Wire form of the event, e.g. `X3Y12`.
    pub fn encode(&self) -> String {
        format!("X{}Y{}", self.instrument, self.key)
    }
}

/// A full batch taken out of the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    events: Vec<String>,
}

impl Batch {
    /// Events in insertion order.
    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// Number of events in the batch.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events joined with `-`.
    pub fn joined(&self) -> String {
        self.events.join(EVENT_SEPARATOR)
    }

    /// Request body for the performance endpoint.
    pub fn to_form_body(&self) -> String {
        format!("{BATCH_FIELD}={}", self.joined())
    }
}

/// Accumulates encoded events until a batch is full.
///
/// Between calls to [`EventBuffer::push`] the length is always below
/// [`BATCH_CAPACITY`].
#[derive(Debug, Default)]
pub struct EventBuffer {
    pending: Vec<String>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self {
            pending: Vec::with_capacity(BATCH_CAPACITY),
        }
    }

    /// Append an event, returning the completed batch when this one fills it.
    ///
    /// The returned batch is no longer owned by the buffer, so it can never be
    /// flushed twice.
    pub fn push(&mut self, record: EventRecord) -> Option<Batch> {
        self.pending.push(record.encode());

        if self.pending.len() >= BATCH_CAPACITY {
            let events = std::mem::replace(&mut self.pending, Vec::with_capacity(BATCH_CAPACITY));
            return Some(Batch { events });
        }

        None
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
