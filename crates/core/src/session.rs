mod builder;

use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::{Local, NaiveDateTime};
use futures_util::Stream;
use thiserror::Error;

use crate::conversation::Conversation;
use crate::gateway::{CommitError, Gateway, Reply};
use crate::persistence::{ExportDocument, SavedItineraries};
use crate::prompt::{Edition, QUICK_ACTIONS, build_prompt};
use crate::stats::TripStats;
use crate::trip::{FormError, TripForm, TripParameters};
pub use builder::SessionBuilder;

/// An operation on a [`PlannerSession`] was refused.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The form is incomplete or out of range.
    #[error(transparent)]
    Form(#[from] FormError),
    /// No model provider is configured.
    #[error("the model is not initialized, please check your API key")]
    Unconfigured,
    /// A follow-up was asked before any itinerary was generated.
    #[error("please generate an itinerary first")]
    NoItinerary,
    /// The follow-up message is blank.
    #[error("the message is empty")]
    EmptyMessage,
    /// The operation only exists in the Pro edition.
    #[error("{0} is only available in the Pro edition")]
    Unsupported(&'static str),
    /// There is no current trip to save.
    #[error("there is no trip to save")]
    NoActiveTrip,
    /// The snapshot index doesn't exist.
    #[error("no saved itinerary at index {index}, {len} saved")]
    SnapshotOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of snapshots.
        len: usize,
    },
    /// The quick action index doesn't exist.
    #[error("no quick action at index {0}")]
    UnknownQuickAction(usize),
    /// The export document could not be serialized.
    #[error("failed to export: {0}")]
    Export(#[from] serde_json::Error),
}

/// What a pending turn produces once committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnKind {
    /// A new itinerary for the given trip.
    Itinerary(TripParameters),
    /// A follow-up on the current itinerary.
    FollowUp,
}

/// A turn whose reply is still streaming.
///
/// Drain it as a [`Stream`] of text fragments, then hand it back to
/// [`PlannerSession::finish`].
#[derive(Debug)]
pub struct PendingTurn {
    kind: TurnKind,
    display: String,
    reply: Reply,
}

impl PendingTurn {
    /// Returns what this turn produces.
    #[inline]
    pub fn kind(&self) -> &TurnKind {
        &self.kind
    }

    /// Returns the text to show for the user side of this turn.
    ///
    /// For an itinerary this is the trip summary, not the instruction
    /// sent to the model.
    #[inline]
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Returns the underlying reply.
    #[inline]
    pub fn reply(&self) -> &Reply {
        &self.reply
    }
}

impl Stream for PendingTurn {
    type Item = String;

    #[inline]
    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().reply).poll_next(cx)
    }
}

/// Everything one traveler's session owns.
///
/// The session is created once at startup and passed explicitly to every
/// handler. Turns are strictly sequential: start one with [`plan`] or
/// [`ask`], drain it, then [`finish`] it.
///
/// [`plan`]: PlannerSession::plan
/// [`ask`]: PlannerSession::ask
/// [`finish`]: PlannerSession::finish
#[derive(Debug)]
pub struct PlannerSession {
    edition: Edition,
    gateway: Gateway,
    conversation: Conversation,
    current_trip: Option<TripParameters>,
    stats: TripStats,
    saved: SavedItineraries,
}

impl PlannerSession {
    fn from_builder(builder: SessionBuilder) -> Self {
        let SessionBuilder { gateway, edition } = builder;
        let gateway = if gateway.is_configured() {
            gateway.with_system_instruction(edition.system_instruction())
        } else {
            gateway
        };
        Self {
            edition,
            gateway,
            conversation: Conversation::new(),
            current_trip: None,
            stats: TripStats::default(),
            saved: SavedItineraries::default(),
        }
    }

    /// Returns the edition of this session.
    #[inline]
    pub fn edition(&self) -> Edition {
        self.edition
    }

    /// Returns `true` if a model provider is configured.
    #[inline]
    pub fn is_configured(&self) -> bool {
        self.gateway.is_configured()
    }

    /// Returns the active conversation.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the trip of the active itinerary.
    #[inline]
    pub fn current_trip(&self) -> Option<&TripParameters> {
        self.current_trip.as_ref()
    }

    /// Starts generating a new itinerary.
    ///
    /// The form is validated first. On success the conversation is
    /// reset and `form` becomes the current trip, even if the reply
    /// later fails.
    pub fn plan(
        &mut self,
        form: &TripForm,
    ) -> Result<PendingTurn, SessionError> {
        let trip = form.validate()?;
        if !self.gateway.is_configured() {
            return Err(SessionError::Unconfigured);
        }

        let prompt = build_prompt(&trip, self.edition);
        debug!("planning {} days in {}", trip.duration(), trip.destination());
        self.conversation.reset();
        self.current_trip = Some(trip.clone());

        let reply = self.gateway.send(&prompt.instruction, &[]);
        Ok(PendingTurn {
            kind: TurnKind::Itinerary(trip),
            display: prompt.display,
            reply,
        })
    }

    /// Asks a follow-up question about the current itinerary.
    pub fn ask(&mut self, message: &str) -> Result<PendingTurn, SessionError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if self.conversation.is_empty() {
            return Err(SessionError::NoItinerary);
        }
        if !self.gateway.is_configured() {
            return Err(SessionError::Unconfigured);
        }

        let reply = self.gateway.send(message, self.conversation.records());
        Ok(PendingTurn {
            kind: TurnKind::FollowUp,
            display: message.to_owned(),
            reply,
        })
    }

    /// Asks the follow-up of the quick action at `index`.
    pub fn quick_action(
        &mut self,
        index: usize,
    ) -> Result<PendingTurn, SessionError> {
        self.require_pro("quick actions")?;
        let action = QUICK_ACTIONS
            .get(index)
            .ok_or(SessionError::UnknownQuickAction(index))?;
        self.ask(action.message)
    }

    /// Commits a drained turn to the conversation.
    ///
    /// A completed itinerary also counts toward the statistics. A failed
    /// turn leaves the conversation untouched.
    pub fn finish(&mut self, turn: PendingTurn) -> Result<(), CommitError> {
        let PendingTurn { kind, reply, .. } = turn;
        if let Err(err) = reply.commit(&mut self.conversation) {
            warn!("discarding the turn: {err}");
            return Err(err);
        }
        if let TurnKind::Itinerary(trip) = kind {
            self.stats.record(&trip);
        }
        Ok(())
    }

    /// Clears the conversation, keeping the current trip.
    #[inline]
    pub fn clear(&mut self) {
        self.conversation.reset();
    }

    /// Saves a snapshot of the current trip and conversation, returning
    /// its index.
    pub fn save(&mut self) -> Result<usize, SessionError> {
        self.save_at(Local::now().naive_local())
    }

    fn save_at(&mut self, now: NaiveDateTime) -> Result<usize, SessionError> {
        self.require_pro("saving itineraries")?;
        let trip = self
            .current_trip
            .as_ref()
            .ok_or(SessionError::NoActiveTrip)?;
        Ok(self.saved.save(trip, &self.conversation, now))
    }

    /// Replaces the current trip and conversation with the snapshot at
    /// `index`.
    ///
    /// Nothing is changed if `index` is out of range.
    pub fn load(&mut self, index: usize) -> Result<(), SessionError> {
        self.require_pro("loading itineraries")?;
        let saved = self.saved.get(index).ok_or(
            SessionError::SnapshotOutOfRange {
                index,
                len: self.saved.len(),
            },
        )?;
        self.current_trip = Some(saved.trip().clone());
        self.conversation.restore(saved.conversation().to_vec());
        debug!("loaded itinerary #{index}");
        Ok(())
    }

    /// Returns the saved snapshots.
    pub fn saved(&self) -> Result<&SavedItineraries, SessionError> {
        self.require_pro("saved itineraries")?;
        Ok(&self.saved)
    }

    /// Serializes the current trip and conversation as a JSON document.
    pub fn export(&self) -> Result<String, SessionError> {
        self.export_at(Local::now().naive_local())
    }

    fn export_at(&self, now: NaiveDateTime) -> Result<String, SessionError> {
        self.require_pro("export")?;
        let document = ExportDocument::new(
            self.current_trip.as_ref(),
            self.conversation.records(),
            now,
        );
        Ok(document.to_json()?)
    }

    /// Returns the statistics of this session.
    pub fn stats(&self) -> Result<&TripStats, SessionError> {
        self.require_pro("statistics")?;
        Ok(&self.stats)
    }

    #[inline]
    fn require_pro(&self, feature: &'static str) -> Result<(), SessionError> {
        if self.edition.is_pro() {
            Ok(())
        } else {
            Err(SessionError::Unsupported(feature))
        }
    }
}
