use crate::application::errors::BotError;
use crate::application::messaging::MessageDispatcher;
use crate::application::replies::Reply;
use crate::domain::entities::Message;
use crate::domain::traits::Bot;

/// Service for processing messages and delivering the replies through a bot
pub struct MessageService<B: Bot> {
    bot: B,
    dispatcher: MessageDispatcher,
}

impl<B: Bot> MessageService<B> {
    pub fn new(bot: B, dispatcher: MessageDispatcher) -> Self {
        Self { bot, dispatcher }
    }

    pub fn bot(&self) -> &B {
        &self.bot
    }

    pub fn bot_mut(&mut self) -> &mut B {
        &mut self.bot
    }

    pub fn dispatcher(&self) -> &MessageDispatcher {
        &self.dispatcher
    }

    /// Process an incoming message and send its replies; returns how many were sent
    pub async fn process(&self, message: Message) -> Result<usize, BotError> {
        tracing::info!("[{}] Processing message: {:?}", message.chat_id, message.content);
        let replies = self.dispatcher.process(&message);
        self.respond(&message.chat_id, &replies).await
    }

    /// Send replies one at a time so they arrive in order
    pub async fn respond(&self, chat_id: &str, replies: &[Reply]) -> Result<usize, BotError> {
        for reply in replies {
            match &reply.keyboard {
                Some(rows) => {
                    self.bot.send_with_keyboard(chat_id, &reply.text, rows.clone()).await?;
                }
                None => {
                    self.bot.send_message(chat_id, &reply.text).await?;
                }
            }
        }
        Ok(replies.len())
    }
}
