//! Trip parameters and the form they are collected from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest trip that can be planned, in days.
pub const MIN_DURATION: u32 = 1;
/// Longest trip that can be planned, in days.
pub const MAX_DURATION: u32 = 30;
/// Minimum number of travelers.
pub const MIN_TRAVELERS: u32 = 1;
/// Maximum number of travelers.
pub const MAX_TRAVELERS: u32 = 20;

/// Interests offered by the Pro form, in menu order.
pub const INTEREST_CATALOGUE: &[&str] = &[
    "Historical Sites",
    "Nature & Wildlife",
    "Food & Cuisine",
    "Adventure Sports",
    "Beaches",
    "Shopping",
    "Art & Museums",
    "Nightlife",
    "Photography",
    "Local Culture",
    "Wellness & Spa",
];

/// Interest preselected by the Pro form.
pub const DEFAULT_INTEREST: &str = "Local Culture";

/// A label that doesn't name any known choice.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownChoice {
    kind: &'static str,
    value: String,
}

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $kind:literal {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $label:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
        )]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[serde(rename = $label)]
                $variant
            ),+
        }

        impl $name {
            /// All choices, in menu order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Returns the human-readable label.
            #[inline]
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownChoice;

            /// Parses a label, ignoring ASCII case and surrounding spaces.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|choice| choice.label().eq_ignore_ascii_case(s))
                    .ok_or_else(|| UnknownChoice {
                        kind: $kind,
                        value: s.to_owned(),
                    })
            }
        }
    };
}

choice_enum! {
    /// The pace of the trip.
    #[derive(Default)]
    pub enum TravelStyle as "travel style" {
        /// A mix of sightseeing and downtime.
        #[default]
        Balanced => "Balanced",
        /// Few activities per day.
        Relaxed => "Relaxed",
        /// As much as fits in a day.
        FastPaced => "Fast-Paced",
        /// Suitable for children.
        FamilyFriendly => "Family-Friendly",
        /// Premium experiences.
        Luxury => "Luxury",
        /// Keeps spending low.
        BudgetConscious => "Budget-Conscious",
    }
}

choice_enum! {
    /// The spending range of the trip.
    #[derive(Default)]
    pub enum Budget as "budget" {
        /// Cheapest options.
        #[default]
        Budget => "Budget",
        /// Comfortable but not lavish.
        MidRange => "Mid-Range",
        /// High-end options.
        Luxury => "Luxury",
        /// No spending limit.
        UltraLuxury => "Ultra-Luxury",
    }
}

choice_enum! {
    /// The preferred kind of lodging.
    #[derive(Default)]
    pub enum Accommodation as "accommodation" {
        /// Regular hotels.
        #[default]
        Hotels => "Hotels",
        /// Resorts.
        Resorts => "Resorts",
        /// Hostels.
        Hostels => "Hostels",
        /// Short-term rentals.
        Airbnb => "Airbnb",
        /// Small independent hotels.
        BoutiqueHotels => "Boutique Hotels",
        /// Any combination of the above.
        Mix => "Mix",
    }
}

/// Optional details collected by the Pro form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripExtras {
    /// The spending range.
    pub budget: Budget,
    /// Number of people traveling.
    pub travelers: u32,
    /// The preferred kind of lodging.
    pub accommodation: Accommodation,
    /// Free-text requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_preferences: Option<String>,
}

impl Default for TripExtras {
    fn default() -> Self {
        Self {
            budget: Budget::default(),
            travelers: 2,
            accommodation: Accommodation::default(),
            additional_preferences: None,
        }
    }
}

/// Validated trip parameters.
///
/// Values of this type can only be built through [`TripForm::validate`],
/// or deserialized from a previously exported document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripParameters {
    destination: String,
    duration: u32,
    interests: Vec<String>,
    style: TravelStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extras: Option<TripExtras>,
}

impl TripParameters {
    /// Returns the destination.
    #[inline]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Returns the duration in days.
    #[inline]
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Returns the selected interests.
    #[inline]
    pub fn interests(&self) -> &[String] {
        &self.interests
    }

    /// Returns the interests as a comma-separated list.
    #[inline]
    pub fn interests_text(&self) -> String {
        self.interests.join(", ")
    }

    /// Returns the travel style.
    #[inline]
    pub fn style(&self) -> TravelStyle {
        self.style
    }

    /// Returns the Pro details, if they were collected.
    #[inline]
    pub fn extras(&self) -> Option<&TripExtras> {
        self.extras.as_ref()
    }
}

/// A form field failed validation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FormError {
    /// The destination is blank.
    #[error("please fill in the destination")]
    MissingDestination,
    /// No interest was given.
    #[error("please select at least one interest")]
    MissingInterests,
    /// The duration is outside the supported range.
    #[error("duration must be between 1 and 30 days, got {0}")]
    DurationOutOfRange(u32),
    /// The traveler count is outside the supported range.
    #[error("travelers must be between 1 and 20, got {0}")]
    TravelersOutOfRange(u32),
}

/// Raw form input, as typed by the traveler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TripForm {
    /// The destination, required.
    pub destination: String,
    /// The duration in days.
    pub duration: u32,
    /// The interests, at least one non-blank entry is required.
    pub interests: Vec<String>,
    /// The travel style.
    pub style: TravelStyle,
    /// The Pro details.
    pub extras: Option<TripExtras>,
}

impl Default for TripForm {
    fn default() -> Self {
        Self {
            destination: String::new(),
            duration: 7,
            interests: Vec::new(),
            style: TravelStyle::default(),
            extras: None,
        }
    }
}

impl TripForm {
    /// Checks the required fields and returns the cleaned parameters.
    pub fn validate(&self) -> Result<TripParameters, FormError> {
        let destination = self.destination.trim();
        if destination.is_empty() {
            return Err(FormError::MissingDestination);
        }

        let interests: Vec<String> = self
            .interests
            .iter()
            .map(|interest| interest.trim())
            .filter(|interest| !interest.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        if interests.is_empty() {
            return Err(FormError::MissingInterests);
        }

        if !(MIN_DURATION..=MAX_DURATION).contains(&self.duration) {
            return Err(FormError::DurationOutOfRange(self.duration));
        }

        let extras = match &self.extras {
            Some(extras) => {
                if !(MIN_TRAVELERS..=MAX_TRAVELERS).contains(&extras.travelers)
                {
                    return Err(FormError::TravelersOutOfRange(
                        extras.travelers,
                    ));
                }
                let additional_preferences = extras
                    .additional_preferences
                    .as_deref()
                    .map(str::trim)
                    .filter(|prefs| !prefs.is_empty())
                    .map(ToOwned::to_owned);
                Some(TripExtras {
                    additional_preferences,
                    ..extras.clone()
                })
            }
            None => None,
        };

        Ok(TripParameters {
            destination: destination.to_owned(),
            duration: self.duration,
            interests,
            style: self.style,
            extras,
        })
    }
}
