//! Oracle prompt construction.

use maestro_core::message::Message;
use maestro_core::provider::ProviderRequest;

use crate::backlog::ConversationBacklog;
use crate::registry::ParticipantRegistry;

/// Instructions given to the oracle ahead of the participant list.
pub const ORCHESTRATION_PROMPT: &str = "# Dialogue Orchestration\n\
## Goal\n\
Given a dialogue between a variable number of people, return the name of the \
person the last message is destined to, or the name of person who *should* \
respond to the last message.\n\
The provided name should never be the same as the person who sent the last message.\n\
If the message is not really destined to anyone, try to pick the name of someone \
who hasn't spoken yet from the list of known participants.\n\
If the last message mentions someone in their response, they should be \
prioritized as the person who should be receiving it.\n\
## Response\n\
Your response should only contain the name of the chosen person and nothing \
else. No other commentary needed.\n";

/// Decoding parameters for oracle requests.
#[derive(Debug, Clone)]
pub struct OracleParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".into(),
            temperature: 1.0,
            max_tokens: Some(100),
        }
    }
}

/// Fixed instructions followed by the known participants, comma separated.
pub fn system_prompt(registry: &ParticipantRegistry) -> String {
    let names: Vec<&str> = registry.all().iter().map(|p| p.label()).collect();
    format!("{ORCHESTRATION_PROMPT}## Known Participants\n{}", names.join(", "))
}

/// One attributed user turn per backlog entry, oldest first.
pub fn backlog_turns(backlog: &ConversationBacklog) -> Vec<Message> {
    backlog
        .iter()
        .map(|m| {
            let author = if m.display_name.is_empty() {
                m.sender_id.as_str()
            } else {
                m.display_name.as_str()
            };
            Message::named_user(author, format!("{author}: {}", m.content.trim()))
        })
        .collect()
}

/// The full oracle request: system prompt then the rendered backlog.
pub fn build_request(
    registry: &ParticipantRegistry,
    backlog: &ConversationBacklog,
    params: &OracleParams,
) -> ProviderRequest {
    let mut messages = Vec::with_capacity(backlog.len() + 1);
    messages.push(Message::system(system_prompt(registry)));
    messages.extend(backlog_turns(backlog));

    ProviderRequest {
        model: params.model.clone(),
        messages,
        temperature: params.temperature,
        max_tokens: params.max_tokens,
    }
}
