//! Collects a [`TripForm`] one field at a time.

use std::fmt::{Display, Write as _};
use std::ops::RangeInclusive;
use std::str::FromStr;

use itinera_core::Edition;
use itinera_core::trip::{
    Accommodation, Budget, DEFAULT_INTEREST, INTEREST_CATALOGUE, MAX_DURATION,
    MAX_TRAVELERS, MIN_DURATION, MIN_TRAVELERS, TravelStyle, TripExtras,
    TripForm,
};
use thiserror::Error;

/// The answer to a field could not be understood.
///
/// The field stays current, so the question can simply be asked again.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Expected a whole number.
    #[error("{0:?} is not a number")]
    NotANumber(String),
    /// The number is outside the allowed range.
    #[error("please enter a number between {min} and {max}")]
    OutOfRange {
        /// Smallest allowed value.
        min: u32,
        /// Largest allowed value.
        max: u32,
    },
    /// A numbered choice is out of the menu.
    #[error("please pick a number between 1 and {0}")]
    OutOfMenu(usize),
    /// The text names no known option.
    #[error("{0:?} is not one of the options")]
    UnknownOption(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Destination,
    Duration,
    Interests,
    Style,
    Budget,
    Travelers,
    Accommodation,
    Preferences,
}

const BASIC_FIELDS: &[Field] = &[
    Field::Destination,
    Field::Duration,
    Field::Interests,
    Field::Style,
];

const PRO_FIELDS: &[Field] = &[
    Field::Destination,
    Field::Duration,
    Field::Budget,
    Field::Travelers,
    Field::Interests,
    Field::Style,
    Field::Accommodation,
    Field::Preferences,
];

/// A step-by-step trip form.
///
/// Blank answers keep the default of the field. Numbers are range checked
/// as they are answered; the destination and interests are still checked
/// by [`TripForm::validate`] when the form is planned.
#[derive(Debug)]
pub struct FormCollector {
    edition: Edition,
    fields: &'static [Field],
    current: usize,
    form: TripForm,
    extras: TripExtras,
}

impl FormCollector {
    /// Creates a collector for the fields of `edition`.
    pub fn new(edition: Edition) -> Self {
        let fields = if edition.is_pro() {
            PRO_FIELDS
        } else {
            BASIC_FIELDS
        };
        Self {
            edition,
            fields,
            current: 0,
            form: TripForm::default(),
            extras: TripExtras::default(),
        }
    }

    /// Returns the question for the current field, or `None` once every
    /// field is answered.
    pub fn question(&self) -> Option<String> {
        let field = self.fields.get(self.current)?;
        let question = match field {
            Field::Destination => {
                "Destination (e.g. Paris, Tokyo, Bali)".to_owned()
            }
            Field::Duration => {
                format!(
                    "Duration in days, {MIN_DURATION}-{MAX_DURATION} [{}]",
                    self.form.duration
                )
            }
            Field::Interests if self.edition.is_pro() => {
                let mut question = menu("Interests", INTEREST_CATALOGUE);
                let _ = write!(
                    question,
                    "\nPick one or more, separated by commas \
                     [{DEFAULT_INTEREST}]"
                );
                question
            }
            Field::Interests => {
                "Interests (e.g. history, food, nature)".to_owned()
            }
            Field::Style => choice_question("Travel style", TravelStyle::ALL),
            Field::Budget => choice_question("Budget", Budget::ALL),
            Field::Travelers => {
                format!(
                    "Number of travelers, {MIN_TRAVELERS}-{MAX_TRAVELERS} [{}]",
                    self.extras.travelers
                )
            }
            Field::Accommodation => {
                choice_question("Accommodation", Accommodation::ALL)
            }
            Field::Preferences => {
                "Additional preferences (dietary needs, mobility, ...)"
                    .to_owned()
            }
        };
        Some(question)
    }

    /// Answers the current field and moves on to the next one.
    pub fn answer(&mut self, input: &str) -> Result<(), FieldError> {
        let Some(field) = self.fields.get(self.current) else {
            return Ok(());
        };
        let input = input.trim();
        match field {
            Field::Destination => self.form.destination = input.to_owned(),
            Field::Duration => {
                self.form.duration = parse_number(
                    input,
                    self.form.duration,
                    MIN_DURATION..=MAX_DURATION,
                )?
            }
            Field::Interests if self.edition.is_pro() => {
                self.form.interests = parse_catalogue_interests(input)?
            }
            Field::Interests => {
                self.form.interests = split_list(input).collect()
            }
            Field::Style => {
                self.form.style = parse_choice(input, TravelStyle::ALL)?
            }
            Field::Budget => {
                self.extras.budget = parse_choice(input, Budget::ALL)?
            }
            Field::Travelers => {
                self.extras.travelers = parse_number(
                    input,
                    self.extras.travelers,
                    MIN_TRAVELERS..=MAX_TRAVELERS,
                )?
            }
            Field::Accommodation => {
                self.extras.accommodation =
                    parse_choice(input, Accommodation::ALL)?
            }
            Field::Preferences => {
                self.extras.additional_preferences =
                    Some(input.to_owned()).filter(|prefs| !prefs.is_empty())
            }
        }
        self.current += 1;
        Ok(())
    }

    /// Returns `true` once every field is answered.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.current >= self.fields.len()
    }

    /// Returns the collected form.
    pub fn finish(self) -> TripForm {
        let Self {
            edition,
            mut form,
            extras,
            ..
        } = self;
        if edition.is_pro() {
            form.extras = Some(extras);
        }
        form
    }
}

fn menu<T: Display>(title: &str, options: &[T]) -> String {
    let mut text = format!("{title}:");
    for (idx, option) in options.iter().enumerate() {
        let _ = write!(text, "\n  {}. {option}", idx + 1);
    }
    text
}

fn choice_question<T: Display + Default>(
    title: &str,
    options: &[T],
) -> String {
    let default = T::default();
    let mut question = menu(title, options);
    let _ = write!(question, "\nPick a number or a name [{default}]");
    question
}

fn parse_number(
    input: &str,
    default: u32,
    range: RangeInclusive<u32>,
) -> Result<u32, FieldError> {
    if input.is_empty() {
        return Ok(default);
    }
    let number = input
        .parse()
        .map_err(|_| FieldError::NotANumber(input.to_owned()))?;
    if !range.contains(&number) {
        return Err(FieldError::OutOfRange {
            min: *range.start(),
            max: *range.end(),
        });
    }
    Ok(number)
}

/// Parses a menu answer, either a 1-based number or a label.
fn parse_choice<T>(input: &str, options: &[T]) -> Result<T, FieldError>
where
    T: Copy + Default + FromStr,
{
    if input.is_empty() {
        return Ok(T::default());
    }
    if let Ok(number) = input.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|idx| options.get(idx))
            .copied()
            .ok_or(FieldError::OutOfMenu(options.len()));
    }
    input
        .parse()
        .map_err(|_| FieldError::UnknownOption(input.to_owned()))
}

fn parse_catalogue_interests(input: &str) -> Result<Vec<String>, FieldError> {
    if input.is_empty() {
        return Ok(vec![DEFAULT_INTEREST.to_owned()]);
    }
    let mut interests: Vec<String> = Vec::new();
    for item in split_list(input) {
        let interest = match item.parse::<usize>() {
            Ok(number) => number
                .checked_sub(1)
                .and_then(|idx| INTEREST_CATALOGUE.get(idx))
                .ok_or(FieldError::OutOfMenu(INTEREST_CATALOGUE.len()))?,
            Err(_) => INTEREST_CATALOGUE
                .iter()
                .find(|interest| interest.eq_ignore_ascii_case(&item))
                .ok_or_else(|| FieldError::UnknownOption(item.clone()))?,
        };
        if !interests.iter().any(|existing| existing.as_str() == *interest) {
            interests.push((*interest).to_owned());
        }
    }
    Ok(interests)
}

fn split_list(input: &str) -> impl Iterator<Item = String> + '_ {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToOwned::to_owned)
}
