use crate::{
    error::{AppError, AppResult},
    models::{Group, MessageKind, NewMessage, SenderKind},
    schema::*,
    DbConn,
};
use axum::Router;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

pub mod admin;
pub mod auth;
pub mod club;
pub mod member;
pub mod news;

pub fn app() -> Router {
    Router::new()
        .nest("/auth", auth::app())
        .nest("/club", club::app())
        .nest("/admin", admin::app())
        .nest("/news", news::app())
        .nest("/member", member::app())
}

pub(crate) const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn required(value: &str, message: &'static str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(message));
    }
    Ok(())
}

/// Append a background notification to a club's group chat.
///
/// Clubs without a group are skipped silently; callers treat any returned
/// error as non-fatal, so a failed notification never fails the operation
/// that triggered it.
pub(crate) async fn notify_group(
    conn: &mut DbConn,
    club_id: i32,
    sender_name: String,
    sender_type: SenderKind,
    message_text: String,
    message_type: MessageKind,
    metadata: Option<serde_json::Value>,
) -> anyhow::Result<()> {
    let Some(group) = club_groups::table
        .filter(club_groups::club_id.eq(club_id))
        .first::<Group>(conn)
        .await
        .optional()?
    else {
        return Ok(());
    };

    diesel::insert_into(group_messages::table)
        .values(NewMessage {
            group_id: group.id,
            sender_id: None,
            sender_name,
            sender_type: sender_type.as_str().to_string(),
            message_text,
            message_type: message_type.as_str().to_string(),
            metadata,
            created_at: Utc::now(),
        })
        .execute(conn)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_empty_and_whitespace() {
        assert!(required("", "name is required").is_err());
        assert!(required("   ", "name is required").is_err());
        assert!(required("Rahul Verma", "name is required").is_ok());
    }

    #[test]
    fn required_reports_the_field_message() {
        let err = required("", "section is required").unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "section is required"));
    }
}
