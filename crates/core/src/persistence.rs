//! In-memory snapshots and the JSON export document.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::conversation::{Conversation, Record};
use crate::trip::TripParameters;

/// Timestamp format used by the export document.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A frozen copy of one trip and its conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedItinerary {
    trip: TripParameters,
    conversation: Vec<Record>,
    saved_at: NaiveDateTime,
}

impl SavedItinerary {
    /// Returns the saved trip.
    #[inline]
    pub fn trip(&self) -> &TripParameters {
        &self.trip
    }

    /// Returns the saved records.
    #[inline]
    pub fn conversation(&self) -> &[Record] {
        &self.conversation
    }

    /// Returns when the snapshot was taken.
    #[inline]
    pub fn saved_at(&self) -> NaiveDateTime {
        self.saved_at
    }

    /// Returns a short label like `Paris (5 days)`.
    pub fn label(&self) -> String {
        format!("{} ({} days)", self.trip.destination(), self.trip.duration())
    }
}

/// The list of snapshots taken in this session, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SavedItineraries {
    items: Vec<SavedItinerary>,
}

impl SavedItineraries {
    /// Appends a snapshot and returns its index.
    pub fn save(
        &mut self,
        trip: &TripParameters,
        conversation: &Conversation,
        now: NaiveDateTime,
    ) -> usize {
        self.items.push(SavedItinerary {
            trip: trip.clone(),
            conversation: conversation.snapshot(),
            saved_at: now,
        });
        debug!("saved itinerary #{}", self.items.len() - 1);
        self.items.len() - 1
    }

    /// Returns the snapshot at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&SavedItinerary> {
        self.items.get(index)
    }

    /// Returns an iterator over the snapshots.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, SavedItinerary> {
        self.items.iter()
    }

    /// Returns the number of snapshots.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing was saved yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a SavedItineraries {
    type Item = &'a SavedItinerary;
    type IntoIter = std::slice::Iter<'a, SavedItinerary>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The document written by an export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// The active trip, `null` if none was planned.
    pub trip_details: Option<TripParameters>,
    /// The active conversation.
    pub chat_history: Vec<Record>,
    /// When the export was taken, formatted with [`TIMESTAMP_FORMAT`].
    pub exported_at: String,
}

impl ExportDocument {
    /// Builds a document from the active state.
    pub fn new(
        trip: Option<&TripParameters>,
        records: &[Record],
        now: NaiveDateTime,
    ) -> Self {
        Self {
            trip_details: trip.cloned(),
            chat_history: records.to_vec(),
            exported_at: now.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Serializes the document as pretty-printed JSON.
    #[inline]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a previously exported document.
    #[inline]
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Returns the suggested file name for an export taken at `now`.
#[inline]
pub fn export_file_name(now: NaiveDateTime) -> String {
    format!("trip_plan_{}.json", now.format("%Y%m%d_%H%M%S"))
}
