//! Plain-text views of the session.
//!
//! Everything here is a pure function of its inputs, the REPL redraws the
//! whole transcript after every command.

use std::fmt::Write as _;

use itinera_core::conversation::{Record, Role};
use itinera_core::persistence::{SavedItineraries, TIMESTAMP_FORMAT};
use itinera_core::{Edition, QUICK_ACTIONS, TripStats};
use owo_colors::OwoColorize;

use crate::commands::Feedback;

/// Left edge of a transcript heading.
pub const BAR_CHAR: &str = "▎";

const BASIC_WELCOME: &str = "Start by typing /plan to enter your trip \
                             details and generate an itinerary.";
const PRO_WELCOME: &str = "Welcome! Type /plan to fill in your trip details \
                           and generate an itinerary. Ask follow-up \
                           questions, use /quick for shortcuts, and /save or \
                           /export the result.";

/// Renders the transcript of `records`.
///
/// An empty conversation renders as a welcome hint. Model records are
/// shown as the assistant.
pub fn render_transcript(
    records: &[Record],
    edition: Edition,
    colored: bool,
) -> String {
    if records.is_empty() {
        return match edition {
            Edition::Basic => BASIC_WELCOME.to_owned(),
            Edition::Pro => PRO_WELCOME.to_owned(),
        };
    }

    let mut text = String::new();
    for (idx, record) in records.iter().enumerate() {
        if idx > 0 {
            text.push_str("\n\n");
        }
        let _ = writeln!(text, "{}", heading(record.role(), colored));
        text.push_str(record.text());
    }
    text
}

/// Returns the heading line of a record.
pub fn heading(role: Role, colored: bool) -> String {
    let label = match role {
        Role::User => "You",
        Role::Model => "Assistant",
    };
    if !colored {
        return format!("{BAR_CHAR}{label}");
    }
    let label = label.bright_white();
    let label = label.bold();
    match role {
        Role::User => format!("{}{label}", BAR_CHAR.bright_yellow()),
        Role::Model => format!("{}{label}", BAR_CHAR.bright_cyan()),
    }
}

/// Renders the session statistics.
pub fn render_stats(stats: &TripStats, messages: usize) -> String {
    let mut text = format!(
        "Total trips:  {}\n\
         Days planned: {}\n\
         Destinations: {}\n\
         Messages:     {messages}",
        stats.total_trips(),
        stats.total_days(),
        stats.destinations().len(),
    );
    if !stats.destinations().is_empty() {
        let names: Vec<_> =
            stats.destinations().iter().map(String::as_str).collect();
        let _ = write!(text, "\nVisited:      {}", names.join(", "));
    }
    text
}

/// Renders the numbered list of saved itineraries.
pub fn render_saved(saved: &SavedItineraries) -> String {
    if saved.is_empty() {
        return "No saved itineraries yet, use /save after planning a trip."
            .to_owned();
    }
    let mut text = String::new();
    for (idx, itinerary) in saved.iter().enumerate() {
        if idx > 0 {
            text.push('\n');
        }
        let _ = write!(
            text,
            "{}. {}, saved at {}",
            idx + 1,
            itinerary.label(),
            itinerary.saved_at().format(TIMESTAMP_FORMAT),
        );
    }
    text
}

/// Renders the numbered list of quick actions.
pub fn render_quick_actions() -> String {
    let mut text = String::from("Quick actions:");
    for (idx, action) in QUICK_ACTIONS.iter().enumerate() {
        let _ = write!(text, "\n  {}. {}", idx + 1, action.label);
    }
    text.push_str("\nRun one with /quick N.");
    text
}

/// Returns the acknowledgement for a rating of the latest reply, or
/// `None` if the conversation does not end with a reply.
pub fn feedback_reply(
    records: &[Record],
    feedback: Feedback,
) -> Option<&'static str> {
    if records.last()?.role() != Role::Model {
        return None;
    }
    Some(match feedback {
        Feedback::Helpful => "Thanks for your feedback!",
        Feedback::NotHelpful => "We'll improve!",
    })
}

/// Renders the command list of `edition`.
pub fn help_text(edition: Edition) -> String {
    let mut commands = vec![
        ("/plan", "plan a new trip"),
        ("/clear", "clear the conversation"),
    ];
    if edition.is_pro() {
        commands.extend([
            ("/save", "save the current itinerary"),
            ("/saved", "list saved itineraries"),
            ("/load N", "load saved itinerary N"),
            ("/export [PATH]", "export the conversation as JSON"),
            ("/stats", "show trip statistics"),
            ("/quick [N]", "list or run quick actions"),
        ]);
    }
    commands.extend([
        ("/helpful", "rate the latest reply as helpful"),
        ("/unhelpful", "rate the latest reply as not helpful"),
        ("/help", "show this list"),
        ("/quit", "leave"),
    ]);

    let mut text = String::from("Commands:");
    for (command, description) in commands {
        let _ = write!(text, "\n  {command:<16}{description}");
    }
    text.push_str("\nAnything else is sent as a follow-up question.");
    text
}

#[cfg(test)]
mod tests {
    use itinera_core::conversation::Conversation;
    use itinera_core::trip::TripForm;

    use super::*;

    #[test]
    fn test_welcome() {
        let basic = render_transcript(&[], Edition::Basic, false);
        assert_eq!(basic, BASIC_WELCOME);
        let pro = render_transcript(&[], Edition::Pro, true);
        assert!(pro.starts_with("Welcome!"));
    }

    #[test]
    fn test_transcript() {
        let records = [
            Record::new(Role::User, "Plan Paris"),
            Record::new(Role::Model, "Day 1: Louvre"),
        ];
        assert_eq!(
            render_transcript(&records, Edition::Pro, false),
            "▎You\nPlan Paris\n\n▎Assistant\nDay 1: Louvre"
        );
    }

    #[test]
    fn test_stats() {
        let mut stats = TripStats::default();
        let trip = TripForm {
            destination: "Paris".to_owned(),
            interests: vec!["food".to_owned()],
            ..TripForm::default()
        }
        .validate()
        .unwrap();
        stats.record(&trip);

        let text = render_stats(&stats, 2);
        assert!(text.contains("Total trips:  1"));
        assert!(text.contains("Days planned: 7"));
        assert!(text.contains("Messages:     2"));
        assert!(text.ends_with("Visited:      Paris"));
    }

    #[test]
    fn test_saved() {
        let mut saved = SavedItineraries::default();
        assert!(render_saved(&saved).starts_with("No saved itineraries"));

        let trip = TripForm {
            destination: "Rome".to_owned(),
            duration: 4,
            interests: vec!["history".to_owned()],
            ..TripForm::default()
        }
        .validate()
        .unwrap();
        let now = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|date| date.and_hms_opt(9, 15, 0))
            .unwrap();
        saved.save(&trip, &Conversation::new(), now);
        assert_eq!(
            render_saved(&saved),
            "1. Rome (4 days), saved at 2024-05-01 09:15:00"
        );
    }

    #[test]
    fn test_feedback() {
        assert_eq!(feedback_reply(&[], Feedback::Helpful), None);

        let mut records = vec![Record::new(Role::User, "Plan Paris")];
        assert_eq!(feedback_reply(&records, Feedback::NotHelpful), None);

        records.push(Record::new(Role::Model, "Day 1: Louvre"));
        assert_eq!(
            feedback_reply(&records, Feedback::Helpful),
            Some("Thanks for your feedback!")
        );
        assert_eq!(
            feedback_reply(&records, Feedback::NotHelpful),
            Some("We'll improve!")
        );
    }

    #[test]
    fn test_help() {
        let basic = help_text(Edition::Basic);
        assert!(basic.contains("/plan"));
        assert!(!basic.contains("/export"));
        assert!(help_text(Edition::Pro).contains("/quick [N]"));
        assert!(render_quick_actions().contains("6. Packing List"));
    }
}
