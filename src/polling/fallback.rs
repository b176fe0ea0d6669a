//! The reply synthesized when polling gives up.

use crate::correlation::WebhookResponse;

/// Content of the locally synthesized timeout reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackResponse {
    /// Apology shown to the user.
    pub message: String,
    /// Generic follow-up prompts.
    pub suggestions: Vec<String>,
}

impl FallbackResponse {
    /// Default apology text.
    pub const DEFAULT_MESSAGE: &'static str = "I'm sorry, I wasn't able to get a response in time. \
         Please try again in a moment.";

    /// Builds the reply for `conversation_id`.
    ///
    /// The user id is left empty and exercises are empty.
    #[must_use]
    pub fn build(&self, conversation_id: &str, timestamp: String) -> WebhookResponse {
        WebhookResponse {
            response: self.message.clone(),
            suggestions: Some(self.suggestions.clone()),
            exercises: Some(Vec::new()),
            user_id: String::new(),
            conversation_id: Some(conversation_id.to_string()),
            timestamp,
        }
    }
}

impl Default for FallbackResponse {
    fn default() -> Self {
        Self {
            message: Self::DEFAULT_MESSAGE.to_string(),
            suggestions: vec![
                "Try sending your message again".to_string(),
                "Rephrase your question".to_string(),
                "Start a new conversation".to_string(),
            ],
        }
    }
}
