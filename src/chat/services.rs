use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    prompts::{ASSISTANT_SYSTEM_PROMPT, FOOD_ANALYSIS_SYSTEM_PROMPT, IMAGE_ATTACHED_SUFFIX},
    repo::{Conversation, Message},
};
use crate::{
    ai::{AiError, ChatMessage, ChatRequest, LlmClient, MessageRole},
    profiles::{self, repo_types::Profile},
};

/// Prior messages replayed to the model on a general chat turn.
pub const HISTORY_WINDOW: i64 = 5;
pub const CHAT_MAX_TOKENS: u32 = 800;
pub const FOOD_ANALYSIS_MAX_TOKENS: u32 = 1500;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Profile not found")]
    ProfileNotFound,
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct UserConditions {
    pub has_diabetes: bool,
    pub hypertension: bool,
    pub ulcer: bool,
    pub weight_loss: bool,
}

impl UserConditions {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            has_diabetes: profile.has_diabetes,
            hypertension: profile.has_condition("hypertension"),
            ulcer: profile.has_condition("ulcer"),
            weight_loss: profile.has_goal("weight_loss"),
        }
    }

    fn to_json(self) -> String {
        serde_json::to_string(&self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub conversation_id: Uuid,
    pub assistant_response: String,
}

/// System prompt, the replayed history, then the new turn tagged with the
/// user's conditions.
pub fn general_messages(
    history: &[Message],
    content: &str,
    conditions: UserConditions,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(ASSISTANT_SYSTEM_PROMPT));
    messages.extend(history.iter().map(|m| match m.role() {
        MessageRole::Assistant => ChatMessage::assistant(m.content.clone()),
        _ => ChatMessage::user(m.content.clone()),
    }));
    messages.push(ChatMessage::user(format!(
        "{content}\n\nUser Conditions: {}",
        conditions.to_json()
    )));
    messages
}

pub fn food_analysis_messages(
    scan_output: &serde_json::Value,
    prompt: &str,
    conditions: UserConditions,
) -> Vec<ChatMessage> {
    let scan = serde_json::to_string_pretty(scan_output).unwrap_or_else(|_| scan_output.to_string());
    vec![
        ChatMessage::system(FOOD_ANALYSIS_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Scan Output: {scan}\n\nUser Prompt: {prompt}\n\nUser Conditions: {}",
            conditions.to_json()
        )),
    ]
}

async fn load_conditions(db: &PgPool, user_id: Uuid) -> Result<UserConditions, ChatError> {
    let profile = profiles::repo::find(db, user_id)
        .await?
        .ok_or(ChatError::ProfileNotFound)?;
    Ok(UserConditions::from_profile(&profile))
}

async fn reply(
    db: &PgPool,
    llm: &dyn LlmClient,
    conversation: &Conversation,
    request: ChatRequest,
) -> Result<ChatReply, ChatError> {
    let response = llm.complete(&request).await?;
    let text = response.content.trim();
    if text.is_empty() {
        return Err(AiError::EmptyResponse.into());
    }
    Message::insert(db, conversation.id, MessageRole::Assistant, text, None).await?;
    debug!(model = %response.model, chars = text.len(), "assistant reply stored");
    Ok(ChatReply {
        conversation_id: conversation.id,
        assistant_response: text.to_string(),
    })
}

/// One general chat turn: store the user's message, ask the assistant, store
/// and return its reply.
#[instrument(skip(db, llm, content))]
pub async fn send_message(
    db: &PgPool,
    llm: &dyn LlmClient,
    user_id: Uuid,
    content: &str,
    image_url: Option<&str>,
) -> Result<ChatReply, ChatError> {
    let conditions = load_conditions(db, user_id).await?;
    let conversation = Conversation::get_or_create(db, user_id).await?;

    // history excludes the turn being sent
    let history = Message::recent(db, conversation.id, HISTORY_WINDOW).await?;
    Message::insert(db, conversation.id, MessageRole::User, content, image_url).await?;

    let request = ChatRequest::new(general_messages(&history, content, conditions))
        .with_max_tokens(CHAT_MAX_TOKENS);
    let out = reply(db, llm, &conversation, request).await?;
    info!(conversation_id = %conversation.id, history = history.len(), "assistant replied");
    Ok(out)
}

/// Discusses a scan result with the assistant inside the user's conversation.
#[instrument(skip(db, llm, prompt, scan_output))]
pub async fn send_food_analysis(
    db: &PgPool,
    llm: &dyn LlmClient,
    user_id: Uuid,
    prompt: &str,
    scan_output: &serde_json::Value,
    image_url: Option<&str>,
) -> Result<ChatReply, ChatError> {
    let conditions = load_conditions(db, user_id).await?;
    let conversation = Conversation::get_or_create(db, user_id).await?;

    let stored = format!("{prompt}{IMAGE_ATTACHED_SUFFIX}");
    Message::insert(db, conversation.id, MessageRole::User, &stored, image_url).await?;

    let request = ChatRequest::new(food_analysis_messages(scan_output, prompt, conditions))
        .with_max_tokens(FOOD_ANALYSIS_MAX_TOKENS);
    let out = reply(db, llm, &conversation, request).await?;
    info!(conversation_id = %conversation.id, "food analysis discussed");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::OffsetDateTime;

    use super::*;
    use crate::profiles::repo_types::sample_profile;

    fn msg(role: &str, content: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_id: Uuid::nil(),
            role: role.into(),
            content: content.into(),
            image_url: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn conditions_come_from_profile() {
        let mut profile = sample_profile();
        let c = UserConditions::from_profile(&profile);
        assert!(c.has_diabetes);
        assert!(c.hypertension);
        assert!(!c.ulcer);
        assert!(c.weight_loss);

        profile.secondary_goals = None;
        profile.health_conditions = Some(vec!["Ulcer".into()]);
        profile.has_diabetes = false;
        let c = UserConditions::from_profile(&profile);
        assert_eq!(
            c,
            UserConditions {
                has_diabetes: false,
                hypertension: false,
                ulcer: true,
                weight_loss: false,
            }
        );
    }

    #[test]
    fn general_turn_replays_history_and_appends_conditions() {
        let history = vec![msg("user", "hi"), msg("assistant", "hello! how can I help?")];
        let conditions = UserConditions::from_profile(&sample_profile());
        let messages = general_messages(&history, "Is garri ok for breakfast?", conditions);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].role, MessageRole::User);
        assert_eq!(messages[2].role, MessageRole::Assistant);
        let last = &messages[3];
        assert_eq!(last.role, MessageRole::User);
        assert!(last.content.starts_with("Is garri ok for breakfast?\n\nUser Conditions: {"));
        assert!(last.content.contains("\"has_diabetes\":true"));
        assert!(last.content.contains("\"weight_loss\":true"));
    }

    #[test]
    fn food_analysis_turn_embeds_scan_output() {
        let scan = json!({ "items": ["rice", "beans"], "score": 62 });
        let messages = food_analysis_messages(
            &scan,
            "What do you think?",
            UserConditions::from_profile(&sample_profile()),
        );
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, FOOD_ANALYSIS_SYSTEM_PROMPT);
        let user = &messages[1].content;
        assert!(user.starts_with("Scan Output: {\n"));
        assert!(user.contains("\n\nUser Prompt: What do you think?\n\nUser Conditions: "));
        assert!(user.contains("\"beans\""));
    }
}
