use std::collections::BTreeSet;

use crate::trip::TripParameters;

/// Counters over the itineraries generated in this session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TripStats {
    total_trips: u64,
    total_days: u64,
    destinations: BTreeSet<String>,
}

impl TripStats {
    /// Counts one successfully generated itinerary.
    pub fn record(&mut self, trip: &TripParameters) {
        self.total_trips += 1;
        self.total_days += u64::from(trip.duration());
        self.destinations.insert(trip.destination().to_owned());
    }

    /// Returns the number of itineraries generated.
    #[inline]
    pub fn total_trips(&self) -> u64 {
        self.total_trips
    }

    /// Returns the sum of all planned durations, in days.
    #[inline]
    pub fn total_days(&self) -> u64 {
        self.total_days
    }

    /// Returns the distinct destinations, sorted.
    #[inline]
    pub fn destinations(&self) -> &BTreeSet<String> {
        &self.destinations
    }
}
