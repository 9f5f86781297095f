#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use super::AttemptId;
use super::Message;
use super::Role;

/// Ordered transcript. Append-only apart from `undo` and `clear`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn len(&self) -> usize {
        return self.messages.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.messages.is_empty();
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn last(&self) -> Option<&Message> {
        return self.messages.last();
    }

    pub fn last_mut(&mut self) -> Option<&mut Message> {
        return self.messages.last_mut();
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        return self.messages.get(index);
    }

    /// Removes the last exchange. Refuses unless the transcript ends on a user
    /// message followed by its assistant reply.
    pub fn undo(&mut self) -> bool {
        let len = self.messages.len();
        if len < 2 {
            return false;
        }

        let exchange = &self.messages[len - 2..];
        if exchange[0].role != Role::User || exchange[1].role != Role::Assistant {
            return false;
        }

        self.messages.truncate(len - 2);
        return true;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn find_by_attempt_mut(&mut self, attempt: AttemptId) -> Option<&mut Message> {
        return self
            .messages
            .iter_mut()
            .find(|message| return message.attempt == Some(attempt));
    }

    /// History through the most recent user message, which is what a retry
    /// sends again.
    pub fn through_last_user(&self) -> Option<&[Message]> {
        let idx = self
            .messages
            .iter()
            .rposition(|message| return message.role == Role::User)?;

        return Some(&self.messages[..=idx]);
    }
}
