use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ai::MessageRole;

/// Each user has exactly one conversation with the assistant.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Conversation {
    pub async fn get_or_create<'e, E: PgExecutor<'e>>(
        db: E,
        user_id: Uuid,
    ) -> anyhow::Result<Conversation> {
        // the no-op update makes RETURNING yield the existing row on conflict
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id, user_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .fetch_one(db)
        .await
        .context("get or create conversation")?;
        Ok(conversation)
    }

    pub async fn find_owned(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"SELECT id, user_id, created_at FROM conversations WHERE id = $1 AND user_id = $2"#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("select conversation")?;
        Ok(conversation)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: String,
    pub content: String,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Message {
    pub fn role(&self) -> MessageRole {
        match self.role.as_str() {
            "assistant" => MessageRole::Assistant,
            _ => MessageRole::User,
        }
    }

    /// All messages of a conversation, oldest first.
    pub async fn list(db: &PgPool, conversation_id: Uuid) -> anyhow::Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, role, content, image_url, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(db)
        .await
        .context("list messages")?;
        Ok(rows)
    }

    /// The last `n` messages, oldest first.
    pub async fn recent(db: &PgPool, conversation_id: Uuid, n: i64) -> anyhow::Result<Vec<Message>> {
        let mut rows = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, role, content, image_url, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(conversation_id)
        .bind(n)
        .fetch_all(db)
        .await
        .context("select recent messages")?;
        rows.reverse();
        Ok(rows)
    }

    pub async fn insert<'e, E: PgExecutor<'e>>(
        db: E,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
        image_url: Option<&str>,
    ) -> anyhow::Result<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, conversation_id, role, content, image_url, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(conversation_id)
        .bind(role.as_str())
        .bind(content)
        .bind(image_url)
        .fetch_one(db)
        .await
        .context("insert message")?;
        Ok(message)
    }
}
