//! Message parser - Parses raw messages into structured messages

use crate::domain::entities::{Content, Message, Sender};

/// Parses incoming messages into structured Message objects
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    /// Parse a text message
    pub fn parse(&self, chat_id: impl Into<String>, text: &str, sender: Option<Sender>) -> Message {
        let content = self.parse_content(text);
        Message::new(chat_id, content).with_sender_opt(sender)
    }

    pub fn parse_content(&self, text: &str) -> Content {
        let text = text.trim_start();
        if text.is_empty() {
            return Content::Empty;
        }

        let body = text
            .strip_prefix('/')
            .or_else(|| text.strip_prefix(self.command_prefix.as_str()));
        match body {
            Some(body) => Self::parse_command(body),
            None => Content::Text(text.to_string()),
        }
    }

    /// `name[@bot] rest of the text`; everything after the first whitespace is the argument
    fn parse_command(body: &str) -> Content {
        let (head, args) = match body.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args),
            None => (body, ""),
        };
        // Group chats address commands as /sleep@my_bot
        let name = head.split('@').next().unwrap_or(head);

        Content::Command {
            name: name.to_string(),
            args: args.to_string(),
        }
    }
}
