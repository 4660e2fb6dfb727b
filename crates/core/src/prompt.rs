//! Prompt construction.
//!
//! Every generation renders two strings from the same parameters: a short
//! summary shown in the transcript while the reply streams, and the
//! verbose instruction that is actually sent to the model.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use thiserror::Error;

use crate::trip::TripParameters;

const BASIC_SYSTEM_INSTRUCTION: &str = "\
You are an AI tour planning assistant.
Your one and only job is to generate a travel itinerary based on the user's initial details (destination, duration, interests, style) and then answer follow-up questions to modify or elaborate on *that specific itinerary*.
You MUST NOT answer any general knowledge questions, questions about people, celebrities, history, math, or anything else unrelated to the user's travel plan.
If the user asks an unrelated question, you MUST politely decline and remind them you are only here to help with their trip.
For example, if the user asks \"Who is the president?\" or \"What is 2+2?\", you should say: \"I'm sorry, but I can only help you with planning and modifying your travel itinerary.\"";

const PRO_SYSTEM_INSTRUCTION: &str = "\
You are an expert AI tour planning assistant with deep knowledge of global destinations, local cultures, and travel logistics.

Your responsibilities:
1. Generate personalized, detailed day-by-day travel itineraries
2. Provide local insights, hidden gems, and cultural tips
3. Answer questions about accommodations, transportation, budget estimates, and activities
4. Suggest alternatives and modifications to the itinerary
5. Offer weather considerations and packing advice
6. Recommend local cuisine and dining experiences
7. Provide safety tips and cultural etiquette advice

Format your responses with:
- Clear day-by-day structure
- Specific activity times and durations
- Estimated costs (when relevant)
- Transportation details between locations
- Restaurant and accommodation suggestions
- Cultural insights and local tips

You MUST stay focused on travel planning. Politely decline unrelated questions.";

const PRO_REQUIREMENTS: &[&str] = &[
    "Daily activities with specific timings",
    "Recommended restaurants for each meal",
    "Transportation options between locations",
    "Estimated costs for activities and meals",
    "Cultural tips and local insights",
    "Hidden gems and local favorites",
    "Best times to visit attractions",
    "Photography opportunities",
    "Weather considerations",
    "Packing suggestions",
];

/// Which flavor of the planner is running.
///
/// `Basic` only knows the four core fields. `Pro` collects the extras and
/// unlocks statistics, snapshots, export and quick actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Edition {
    /// The minimal planner.
    Basic,
    /// The full planner.
    #[default]
    Pro,
}

impl Edition {
    /// Returns the system instruction given to the model.
    #[inline]
    pub fn system_instruction(self) -> &'static str {
        match self {
            Edition::Basic => BASIC_SYSTEM_INSTRUCTION,
            Edition::Pro => PRO_SYSTEM_INSTRUCTION,
        }
    }

    /// Returns `true` if stats, snapshots, export and quick actions are
    /// available.
    #[inline]
    pub fn is_pro(self) -> bool {
        self == Edition::Pro
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edition::Basic => f.write_str("basic"),
            Edition::Pro => f.write_str("pro"),
        }
    }
}

/// The edition name is neither `basic` nor `pro`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown edition {0:?}, expected `basic` or `pro`")]
pub struct UnknownEdition(String);

impl FromStr for Edition {
    type Err = UnknownEdition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Edition::Basic),
            "pro" => Ok(Edition::Pro),
            _ => Err(UnknownEdition(s.to_owned())),
        }
    }
}

/// The two renderings of one generation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    /// Summary shown to the traveler, never sent to the model.
    pub display: String,
    /// Instruction sent to the model.
    pub instruction: String,
}

/// A canned follow-up question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuickAction {
    /// Short label for menus.
    pub label: &'static str,
    /// The message sent as the follow-up turn.
    pub message: &'static str,
}

/// Follow-up shortcuts offered by the Pro edition.
pub const QUICK_ACTIONS: &[QuickAction] = &[
    QuickAction {
        label: "Budget Activities",
        message: "Suggest budget-friendly activities",
    },
    QuickAction {
        label: "Local Restaurants",
        message: "Recommend local restaurants",
    },
    QuickAction {
        label: "Accommodations",
        message: "Find accommodation options",
    },
    QuickAction {
        label: "Transportation",
        message: "Plan transportation",
    },
    QuickAction {
        label: "Photo Spots",
        message: "Best photo spots",
    },
    QuickAction {
        label: "Packing List",
        message: "Create packing list",
    },
    QuickAction {
        label: "Weather Info",
        message: "Weather considerations",
    },
];

/// Renders the display summary and the model instruction.
pub fn build_prompt(params: &TripParameters, edition: Edition) -> Prompt {
    match edition {
        Edition::Basic => build_basic(params),
        Edition::Pro => build_pro(params),
    }
}

fn build_basic(params: &TripParameters) -> Prompt {
    let destination = params.destination();
    let duration = params.duration();
    let interests = params.interests_text();
    let style = params.style();

    let display = format!(
        "**Planning a trip with the following details:**\n\
         - **Destination:** {destination}\n\
         - **Duration:** {duration} days\n\
         - **Interests:** {interests}\n\
         - **Travel Style:** {style}"
    );
    let instruction = format!(
        "Plan a {duration}-day trip to {destination} for a traveler with \
         interests in {interests} and a {style} travel style. Create a \
         detailed, day-by-day itinerary. Make it engaging and easy to read. \
         Use Markdown for formatting (like bolding and bullet points)."
    );
    Prompt {
        display,
        instruction,
    }
}

fn build_pro(params: &TripParameters) -> Prompt {
    let destination = params.destination();
    let duration = params.duration();
    let interests = params.interests_text();
    let style = params.style();
    let extras = params.extras().cloned().unwrap_or_default();
    let budget = extras.budget;
    let travelers = extras.travelers;
    let accommodation = extras.accommodation;
    let preferences =
        extras.additional_preferences.as_deref().unwrap_or("None");

    let display = format!(
        "**Planning your {duration}-day adventure to {destination}!**\n\
         \n\
         **Trip Details:**\n\
         - **Destination:** {destination}\n\
         - **Duration:** {duration} days\n\
         - **Budget:** {budget}\n\
         - **Travelers:** {travelers} person(s)\n\
         - **Interests:** {interests}\n\
         - **Travel Style:** {style}\n\
         - **Accommodation:** {accommodation}\n\
         - **Additional Preferences:** {preferences}"
    );

    let mut instruction = format!(
        "Plan a comprehensive {duration}-day trip to {destination} for \
         {travelers} traveler(s) with a {budget} budget.\n\
         \n\
         Travel Interests: {interests}\n\
         Travel Style: {style}\n\
         Accommodation Preference: {accommodation}\n\
         Additional Preferences: {preferences}\n\
         \n\
         Create a detailed day-by-day itinerary that includes:\n"
    );
    for (idx, requirement) in PRO_REQUIREMENTS.iter().enumerate() {
        // Writing into a `String` never fails.
        let _ = writeln!(instruction, "{}. {requirement}", idx + 1);
    }
    instruction.push_str(
        "\nMake it engaging, practical, and easy to follow. \
         Use clear formatting.",
    );

    Prompt {
        display,
        instruction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trip::{Accommodation, Budget, TravelStyle, TripExtras, TripForm};

    fn paris(extras: Option<TripExtras>) -> TripParameters {
        TripForm {
            destination: "Paris".to_owned(),
            duration: 5,
            interests: vec!["museums".to_owned(), "food".to_owned()],
            style: TravelStyle::Relaxed,
            extras,
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_basic_prompt() {
        let prompt = build_prompt(&paris(None), Edition::Basic);
        assert!(prompt.display.contains("- **Destination:** Paris"));
        assert!(prompt.display.contains("- **Duration:** 5 days"));
        assert_eq!(
            prompt.instruction,
            "Plan a 5-day trip to Paris for a traveler with interests in \
             museums, food and a Relaxed travel style. Create a detailed, \
             day-by-day itinerary. Make it engaging and easy to read. Use \
             Markdown for formatting (like bolding and bullet points)."
        );
    }

    #[test]
    fn test_pro_prompt() {
        let extras = TripExtras {
            budget: Budget::MidRange,
            travelers: 3,
            accommodation: Accommodation::BoutiqueHotels,
            additional_preferences: Some("No early mornings".to_owned()),
        };
        let prompt = build_prompt(&paris(Some(extras)), Edition::Pro);
        assert!(prompt.instruction.starts_with(
            "Plan a comprehensive 5-day trip to Paris for 3 traveler(s) with \
             a Mid-Range budget."
        ));
        assert!(
            prompt
                .instruction
                .contains("Accommodation Preference: Boutique Hotels")
        );
        assert!(prompt.instruction.contains("1. Daily activities"));
        assert!(prompt.instruction.contains("10. Packing suggestions"));
        assert!(
            prompt
                .display
                .contains("- **Additional Preferences:** No early mornings")
        );
    }

    #[test]
    fn test_pro_prompt_defaults() {
        let prompt = build_prompt(&paris(None), Edition::Pro);
        assert!(prompt.display.contains("- **Travelers:** 2 person(s)"));
        assert!(prompt.instruction.contains("Additional Preferences: None"));
    }

    #[test]
    fn test_edition() {
        assert_eq!("Basic".parse(), Ok(Edition::Basic));
        assert_eq!(" pro".parse(), Ok(Edition::Pro));
        assert!("deluxe".parse::<Edition>().is_err());
        assert!(Edition::Pro.is_pro());
        assert_ne!(
            Edition::Basic.system_instruction(),
            Edition::Pro.system_instruction()
        );
    }
}
