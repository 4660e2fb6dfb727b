/// A request to be sent to the model provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The system instruction, fixed for the lifetime of a gateway.
    pub system_instruction: Option<String>,
    /// The input messages, oldest first. The last one is the new
    /// message of this turn.
    pub messages: Vec<ModelMessage>,
}

impl ModelRequest {
    /// Returns the number of user messages in this request.
    ///
    /// Since every model message answers exactly one user message, this
    /// is also the 1-based index of the turn being requested.
    #[inline]
    pub fn user_turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|msg| matches!(msg, ModelMessage::User(_)))
            .count()
    }

    /// Returns the latest user message, if any.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|msg| match msg {
            ModelMessage::User(text) => Some(text.as_str()),
            ModelMessage::Model(_) => None,
        })
    }
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// A user input text.
    User(String),
    /// A text previously generated by the model.
    Model(String),
}

impl ModelMessage {
    /// Returns the text of this message.
    #[inline]
    pub fn text(&self) -> &str {
        match self {
            ModelMessage::User(text) | ModelMessage::Model(text) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_turns() {
        let req = ModelRequest {
            system_instruction: None,
            messages: vec![
                ModelMessage::User("Plan a trip".to_owned()),
                ModelMessage::Model("Day 1".to_owned()),
                ModelMessage::User("Make it cheaper".to_owned()),
            ],
        };
        assert_eq!(req.user_turns(), 2);
        assert_eq!(req.last_user_message(), Some("Make it cheaper"));
        assert_eq!(ModelRequest::default().last_user_message(), None);
    }
}
