//! Message dispatcher - Routes messages to the tracker and renders replies

use crate::application::replies::{self, Reply};
use crate::application::services::tracker::{CommandRequest, Outcome, SleepTracker};
use crate::domain::entities::{Content, Message, Sender};
use super::parser::MessageParser;

/// Message dispatcher - parses, runs the command, renders the outcome
pub struct MessageDispatcher {
    parser: MessageParser,
    tracker: SleepTracker,
}

impl MessageDispatcher {
    pub fn new(prefix: impl Into<String>, tracker: SleepTracker) -> Self {
        Self {
            parser: MessageParser::new(prefix),
            tracker,
        }
    }

    pub fn parser(&self) -> &MessageParser {
        &self.parser
    }

    /// Process a raw text message
    pub fn process_text(&self, chat_id: impl Into<String>, sender: Sender, text: &str) -> Vec<Reply> {
        let message = self.parser.parse(chat_id, text, Some(sender));
        self.process(&message)
    }

    /// Process a message; every command or text gets at least one reply
    pub fn process(&self, message: &Message) -> Vec<Reply> {
        let outcome = match (&message.content, &message.sender) {
            (Content::Command { name, args }, Some(sender)) => {
                let display_name = sender.display_name();
                self.tracker.handle(&CommandRequest {
                    user_id: sender.id,
                    display_name: &display_name,
                    command: name,
                    args,
                })
            }
            (Content::Command { name, .. }, None) => {
                tracing::warn!("[{}] /{} without a sender, cannot attribute it", message.chat_id, name);
                Outcome::Failed
            }
            (Content::Text(_), _) => Outcome::NotACommand,
            (Content::Empty, _) => return Vec::new(),
        };

        let replies = replies::render(&outcome);
        tracing::debug!("[{}] {} -> {} replies", message.chat_id, message.id, replies.len());
        replies
    }
}
