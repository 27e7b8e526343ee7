use crate::common::{Message, MessageId};

/// Single-slot tracker for the message currently being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditSession {
    #[default]
    Idle,
    Editing {
        message_id: MessageId,
        draft: String,
    },
}

impl EditSession {
    /// Starts editing `message`, seeding the draft with its current content.
    /// Any draft for another message is dropped without asking.
    pub fn begin(&mut self, message: &Message) {
        if let EditSession::Editing { message_id, .. } = self {
            if *message_id != message.id {
                log::debug!("Discarding draft for message {message_id}; now editing {}", message.id);
            }
        }
        *self = EditSession::Editing {
            message_id: message.id,
            draft: message.content.clone(),
        };
    }

    pub fn update_draft(&mut self, text: impl Into<String>) {
        if let EditSession::Editing { draft, .. } = self {
            *draft = text.into();
        }
    }

    pub fn cancel(&mut self) {
        *self = EditSession::Idle;
    }

    /// The edit to submit, or `None` when idle or when the draft is blank.
    /// The session stays open until [`complete`](Self::complete) confirms the save.
    pub fn commit(&self) -> Option<(MessageId, String)> {
        match self {
            EditSession::Editing { message_id, draft } => {
                let draft = draft.trim();
                (!draft.is_empty()).then(|| (*message_id, draft.to_string()))
            }
            EditSession::Idle => None,
        }
    }

    /// A save for `id` succeeded. Leaves a newer edit of another message alone.
    pub fn complete(&mut self, id: MessageId) {
        if self.editing() == Some(id) {
            *self = EditSession::Idle;
        }
    }

    pub fn editing(&self) -> Option<MessageId> {
        match self {
            EditSession::Editing { message_id, .. } => Some(*message_id),
            EditSession::Idle => None,
        }
    }

    /// Mutable access to the draft for text inputs.
    pub fn draft_mut(&mut self) -> Option<&mut String> {
        match self {
            EditSession::Editing { draft, .. } => Some(draft),
            EditSession::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_captures_original_content() {
        let mut session = EditSession::default();
        session.begin(&Message::user(1, "Hello!"));
        assert_eq!(
            session,
            EditSession::Editing {
                message_id: MessageId(1),
                draft: "Hello!".to_string()
            }
        );
    }

    #[test]
    fn switching_target_discards_previous_draft() {
        let mut session = EditSession::default();
        session.begin(&Message::user(1, "first"));
        session.update_draft("half-written");
        session.begin(&Message::user(3, "second"));

        assert_eq!(session.editing(), Some(MessageId(3)));
        assert_eq!(session.commit(), Some((MessageId(3), "second".to_string())));
    }

    #[test]
    fn at_most_one_edit_for_any_sequence_of_begins() {
        let messages: Vec<_> = (1..=5).map(|id| Message::user(id, format!("m{id}"))).collect();
        let mut session = EditSession::default();
        for message in messages.iter().chain(messages.iter().rev()) {
            session.begin(message);
            assert_eq!(session.editing(), Some(message.id));
        }
    }

    #[test]
    fn blank_draft_commits_nothing() {
        let mut session = EditSession::default();
        assert_eq!(session.commit(), None);

        session.begin(&Message::user(1, "Hello!"));
        session.update_draft("   ");
        assert_eq!(session.commit(), None);
        assert_eq!(session.editing(), Some(MessageId(1)));
    }

    #[test]
    fn successful_save_returns_to_idle() {
        let mut session = EditSession::default();
        session.begin(&Message::user(1, "Hello!"));
        session.update_draft("Edited message");
        assert_eq!(
            session.commit(),
            Some((MessageId(1), "Edited message".to_string()))
        );

        session.complete(MessageId(1));
        assert_eq!(session, EditSession::Idle);
    }

    #[test]
    fn stale_save_keeps_newer_edit_open() {
        let mut session = EditSession::default();
        session.begin(&Message::user(1, "a"));
        session.begin(&Message::user(2, "b"));

        session.complete(MessageId(1));
        assert_eq!(session.editing(), Some(MessageId(2)));
    }

    #[test]
    fn draft_changes_ignored_when_idle() {
        let mut session = EditSession::default();
        session.update_draft("nothing to edit");
        assert_eq!(session, EditSession::Idle);
        assert!(session.draft_mut().is_none());
    }
}
