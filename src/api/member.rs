use super::MIN_PASSWORD_LEN;
use crate::{
    auth::{self, MemberAuth},
    error::{AppError, AppResult},
    models::{
        Group, Member, Membership, MembershipStatus, Message, MessageKind, NewMessage, SenderKind,
    },
    schema::*,
    DbConn, DbPool,
};
use axum::{
    extract::{Path, Query},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};

const DEFAULT_MESSAGE_LIMIT: i64 = 50;
const MAX_MESSAGE_LIMIT: i64 = 200;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MembershipResponse {
    id: i32,
    club_id: i32,
    club_name: String,
    status: String,
    joined_at: DateTime<Utc>,
}

impl From<Membership> for MembershipResponse {
    fn from(m: Membership) -> Self {
        MembershipResponse {
            id: m.id,
            club_id: m.club_id,
            club_name: m.club_name,
            status: m.status,
            joined_at: m.joined_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageResponse {
    id: i32,
    group_id: i32,
    sender_id: Option<i32>,
    sender_name: String,
    sender_type: String,
    message_text: String,
    message_type: String,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        MessageResponse {
            id: m.id,
            group_id: m.group_id,
            sender_id: m.sender_id,
            sender_name: m.sender_name,
            sender_type: m.sender_type,
            message_text: m.message_text,
            message_type: m.message_type,
            metadata: m.metadata,
            created_at: m.created_at,
        }
    }
}

async fn list_clubs(
    Extension(pool): Extension<DbPool>,
    MemberAuth(member_id): MemberAuth,
) -> AppResult<Json<Vec<MembershipResponse>>> {
    let conn = &mut pool.get().await?;

    let memberships = club_memberships::table
        .filter(club_memberships::member_id.eq(member_id))
        .filter(club_memberships::status.eq(MembershipStatus::Active.as_str()))
        .order(club_memberships::joined_at.asc())
        .load::<Membership>(conn)
        .await?;

    Ok(Json(
        memberships
            .into_iter()
            .map(MembershipResponse::from)
            .collect(),
    ))
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_MESSAGE_LIMIT).clamp(1, MAX_MESSAGE_LIMIT)
}

async fn require_active_membership(
    conn: &mut DbConn,
    member_id: i32,
    club_id: i32,
) -> AppResult<()> {
    club_memberships::table
        .filter(club_memberships::member_id.eq(member_id))
        .filter(club_memberships::club_id.eq(club_id))
        .filter(club_memberships::status.eq(MembershipStatus::Active.as_str()))
        .first::<Membership>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::auth("you are not an active member of this club"))?;
    Ok(())
}

async fn find_group(conn: &mut DbConn, club_id: i32) -> AppResult<Group> {
    club_groups::table
        .filter(club_groups::club_id.eq(club_id))
        .first::<Group>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found("the club group does not exist"))
}

#[derive(Deserialize)]
struct ListMessagesQuery {
    limit: Option<i64>,
}

/// The most recent messages of a club's group chat, oldest first.
async fn list_messages(
    Extension(pool): Extension<DbPool>,
    Path(club_id): Path<i32>,
    Query(query): Query<ListMessagesQuery>,
    MemberAuth(member_id): MemberAuth,
) -> AppResult<Json<Vec<MessageResponse>>> {
    let conn = &mut pool.get().await?;

    require_active_membership(conn, member_id, club_id).await?;
    let group = find_group(conn, club_id).await?;

    let mut messages = group_messages::table
        .filter(group_messages::group_id.eq(group.id))
        .order(group_messages::created_at.desc())
        .limit(clamp_limit(query.limit))
        .load::<Message>(conn)
        .await?;
    messages.reverse();

    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostMessageRequest {
    message_text: String,
}

async fn post_message(
    Extension(pool): Extension<DbPool>,
    Path(club_id): Path<i32>,
    MemberAuth(member_id): MemberAuth,
    Json(req): Json<PostMessageRequest>,
) -> AppResult<Json<MessageResponse>> {
    let text = req.message_text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::validation("message text is required"));
    }

    let conn = &mut pool.get().await?;

    let member = members::table
        .find(member_id)
        .filter(members::is_active.eq(true))
        .first::<Member>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::auth("unknown or inactive member"))?;

    require_active_membership(conn, member.id, club_id).await?;
    let group = find_group(conn, club_id).await?;

    let message = diesel::insert_into(group_messages::table)
        .values(NewMessage {
            group_id: group.id,
            sender_id: Some(member.id),
            sender_name: member.name,
            sender_type: SenderKind::Member.as_str().to_string(),
            message_text: text,
            message_type: MessageKind::Text.as_str().to_string(),
            metadata: None,
            created_at: Utc::now(),
        })
        .get_result::<Message>(conn)
        .await?;

    Ok(Json(MessageResponse::from(message)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

async fn change_password(
    Extension(pool): Extension<DbPool>,
    MemberAuth(member_id): MemberAuth,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<Json<()>> {
    if req.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation("new password is too short"));
    }

    let conn = &mut pool.get().await?;

    let member = members::table
        .find(member_id)
        .filter(members::is_active.eq(true))
        .first::<Member>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::auth("unknown or inactive member"))?;

    if !auth::verify_password(req.current_password, &member.password_hash)? {
        return Err(AppError::auth("current password is incorrect"));
    }

    diesel::update(members::table.find(member.id))
        .set(members::password_hash.eq(auth::hash_password(req.new_password)?))
        .execute(conn)
        .await?;

    Ok(Json(()))
}

pub fn app() -> Router {
    Router::new()
        .route("/clubs", get(list_clubs))
        .route("/chat/:club_id/messages", get(list_messages).post(post_message))
        .route("/password", post(change_password))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(clamp_limit(None), 50);
        assert_eq!(clamp_limit(Some(10)), 10);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(10_000)), 200);
    }
}
