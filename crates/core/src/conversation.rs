//! Conversation-related types.

use itinera_model::ModelMessage;
use serde::{Deserialize, Serialize};

/// Who produced a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The traveler.
    User,
    /// The hosted model.
    Model,
}

/// One entry of the conversation.
///
/// Records are immutable once appended. On the wire a record is written
/// as `{"role": "user", "parts": ["..."]}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "WireRecord", from = "WireRecord")]
pub struct Record {
    role: Role,
    text: String,
}

impl Record {
    /// Creates a record.
    #[inline]
    pub fn new<S: Into<String>>(role: Role, text: S) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Returns the role of this record.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text of this record.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn to_model_message(&self) -> ModelMessage {
        match self.role {
            Role::User => ModelMessage::User(self.text.clone()),
            Role::Model => ModelMessage::Model(self.text.clone()),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireRecord {
    role: Role,
    parts: Vec<String>,
}

impl From<Record> for WireRecord {
    fn from(record: Record) -> Self {
        Self {
            role: record.role,
            parts: vec![record.text],
        }
    }
}

impl From<WireRecord> for Record {
    fn from(wire: WireRecord) -> Self {
        Self {
            role: wire.role,
            text: wire.parts.concat(),
        }
    }
}

/// An ordered, append-only log of records.
///
/// The log is only ever appended to or wholly reset. Insertion order is
/// the display order.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Conversation {
    records: Vec<Record>,
}

impl Conversation {
    /// Creates an empty conversation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one record at the tail.
    #[inline]
    pub fn append<S: Into<String>>(&mut self, role: Role, text: S) {
        self.records.push(Record::new(role, text));
    }

    /// Replaces the log with an empty one.
    #[inline]
    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Returns a copy of all records.
    #[inline]
    pub fn snapshot(&self) -> Vec<Record> {
        self.records.clone()
    }

    /// Returns all records, oldest first.
    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been recorded yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replaces the whole log, used when a saved itinerary is reloaded.
    pub(crate) fn restore(&mut self, records: Vec<Record>) {
        self.records = records;
    }
}

impl From<Vec<Record>> for Conversation {
    #[inline]
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_append_order() {
        let mut conversation = Conversation::new();
        conversation.append(Role::User, "Plan Paris");
        conversation.append(Role::Model, "Day 1: Louvre");
        conversation.append(Role::User, "Make it cheaper");

        let texts: Vec<_> =
            conversation.records().iter().map(Record::text).collect();
        assert_eq!(texts, ["Plan Paris", "Day 1: Louvre", "Make it cheaper"]);
        assert_eq!(conversation.records()[1].role(), Role::Model);
    }

    #[test]
    fn test_reset() {
        let mut conversation = Conversation::new();
        conversation.append(Role::User, "Plan Paris");
        conversation.append(Role::Model, "Day 1: Louvre");
        conversation.reset();
        assert!(conversation.snapshot().is_empty());
        assert!(conversation.is_empty());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut conversation = Conversation::new();
        conversation.append(Role::User, "Plan Paris");
        let snapshot = conversation.snapshot();
        conversation.append(Role::Model, "Day 1: Louvre");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn test_wire_format() {
        let record = Record::new(Role::Model, "Day 1: Louvre");
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "role": "model", "parts": ["Day 1: Louvre"] })
        );

        let record: Record = serde_json::from_value(
            json!({ "role": "user", "parts": ["Plan ", "Paris"] }),
        )
        .unwrap();
        assert_eq!(record, Record::new(Role::User, "Plan Paris"));
    }
}
