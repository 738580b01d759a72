use super::{notify_group, required};
use crate::{
    auth::AdminAuth,
    error::{AppError, AppResult},
    models::{Club, MessageKind, NewsItem, SenderKind},
    schema::*,
    DbPool,
};
use axum::{
    extract::{Path, Query},
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::{dsl::not, prelude::*};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewsResponse {
    id: i32,
    club_id: i32,
    title: String,
    content: String,
    author: String,
    likes: i32,
    featured: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<NewsItem> for NewsResponse {
    fn from(item: NewsItem) -> Self {
        NewsResponse {
            id: item.id,
            club_id: item.club_id,
            title: item.title,
            content: item.content,
            author: item.author,
            likes: item.likes,
            featured: item.featured,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

fn news_update_message(item: &NewsItem) -> String {
    format!(
        "NEW UPDATE\n\n{}\n\n{}\n\n- {}",
        item.title, item.content, item.author
    )
}

fn announcement_message(item: &NewsItem) -> String {
    format!(
        "UPDATE EDITED\n\n{}\n\n{}\n\n- {}",
        item.title, item.content, item.author
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsListQuery {
    club_id: Option<i32>,
}

async fn list(
    Extension(pool): Extension<DbPool>,
    Query(query): Query<NewsListQuery>,
) -> AppResult<Json<Vec<NewsResponse>>> {
    let conn = &mut pool.get().await?;

    let items = match query.club_id {
        Some(club_id) => {
            news::table
                .filter(news::club_id.eq(club_id))
                .order(news::created_at.desc())
                .load::<NewsItem>(conn)
                .await?
        }
        None => {
            news::table
                .order(news::created_at.desc())
                .load::<NewsItem>(conn)
                .await?
        }
    };

    Ok(Json(items.into_iter().map(NewsResponse::from).collect()))
}

/// Increment a news item's like counter.
///
/// The once-per-reader rule lives in the client's local "already liked" set;
/// the store itself accepts every call.
// TODO: enforcing once-per-reader server side needs a durable reader identity
async fn like(
    Extension(pool): Extension<DbPool>,
    Path(news_id): Path<i32>,
) -> AppResult<Json<NewsResponse>> {
    let conn = &mut pool.get().await?;

    let item = diesel::update(news::table.find(news_id))
        .set(news::likes.eq(news::likes + 1))
        .get_result::<NewsItem>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found("the news item does not exist"))?;

    Ok(Json(NewsResponse::from(item)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsItemRequest {
    pub title: String,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub featured: bool,
}

async fn create(
    Extension(pool): Extension<DbPool>,
    AdminAuth(club_id): AdminAuth,
    Json(req): Json<NewsItemRequest>,
) -> AppResult<Json<NewsResponse>> {
    #[derive(Insertable)]
    #[diesel(table_name = news)]
    struct NewNewsItem {
        club_id: i32,
        title: String,
        content: String,
        author: String,
        likes: i32,
        featured: bool,
        created_at: DateTime<Utc>,
    }

    required(&req.title, "title is required")?;
    required(&req.content, "content is required")?;
    required(&req.author, "author is required")?;

    let conn = &mut pool.get().await?;

    let club = clubs::table
        .find(club_id)
        .first::<Club>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::auth("unknown club"))?;

    let item = diesel::insert_into(news::table)
        .values(NewNewsItem {
            club_id: club.id,
            title: req.title.trim().to_string(),
            content: req.content,
            author: req.author.trim().to_string(),
            likes: 0,
            featured: req.featured,
            created_at: Utc::now(),
        })
        .get_result::<NewsItem>(conn)
        .await?;

    // Mirror the update into the club's group chat, best effort.
    if let Err(e) = notify_group(
        conn,
        club.id,
        format!("{} Admin", club.name),
        SenderKind::Admin,
        news_update_message(&item),
        MessageKind::NewsUpdate,
        Some(serde_json::json!({ "news_id": item.id, "news_title": item.title })),
    )
    .await
    {
        tracing::warn!("failed to post news update to group: {e:#}");
    }

    Ok(Json(NewsResponse::from(item)))
}

async fn update(
    Extension(pool): Extension<DbPool>,
    Path(news_id): Path<i32>,
    AdminAuth(club_id): AdminAuth,
    Json(req): Json<NewsItemRequest>,
) -> AppResult<Json<NewsResponse>> {
    #[derive(AsChangeset)]
    #[diesel(table_name = news)]
    struct NewsEdit {
        title: String,
        content: String,
        author: String,
        featured: bool,
        updated_at: DateTime<Utc>,
    }

    required(&req.title, "title is required")?;
    required(&req.content, "content is required")?;
    required(&req.author, "author is required")?;

    let conn = &mut pool.get().await?;

    let club = clubs::table
        .find(club_id)
        .first::<Club>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::auth("unknown club"))?;

    // Fields are replaced wholesale; id and likes are preserved.
    let item = diesel::update(news::table.find(news_id).filter(news::club_id.eq(club.id)))
        .set(NewsEdit {
            title: req.title.trim().to_string(),
            content: req.content,
            author: req.author.trim().to_string(),
            featured: req.featured,
            updated_at: Utc::now(),
        })
        .get_result::<NewsItem>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found("the news item does not exist"))?;

    if let Err(e) = notify_group(
        conn,
        club.id,
        format!("{} Admin", club.name),
        SenderKind::Admin,
        announcement_message(&item),
        MessageKind::Announcement,
        Some(serde_json::json!({
            "news_id": item.id,
            "news_title": item.title,
            "action": "edited",
        })),
    )
    .await
    {
        tracing::warn!("failed to post edit notification to group: {e:#}");
    }

    Ok(Json(NewsResponse::from(item)))
}

async fn delete_item(
    Extension(pool): Extension<DbPool>,
    Path(news_id): Path<i32>,
    AdminAuth(club_id): AdminAuth,
) -> AppResult<Json<()>> {
    let conn = &mut pool.get().await?;

    let deleted = diesel::delete(news::table.find(news_id).filter(news::club_id.eq(club_id)))
        .execute(conn)
        .await?;
    if deleted == 0 {
        return Err(AppError::not_found("the news item does not exist"));
    }

    Ok(Json(()))
}

async fn toggle_featured(
    Extension(pool): Extension<DbPool>,
    Path(news_id): Path<i32>,
    AdminAuth(club_id): AdminAuth,
) -> AppResult<Json<NewsResponse>> {
    let conn = &mut pool.get().await?;

    let item = diesel::update(news::table.find(news_id).filter(news::club_id.eq(club_id)))
        .set(news::featured.eq(not(news::featured)))
        .get_result::<NewsItem>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found("the news item does not exist"))?;

    Ok(Json(NewsResponse::from(item)))
}

pub fn app() -> Router {
    Router::new()
        .route("/list", get(list))
        .route("/", post(create))
        .route("/:news_id", put(update).delete(delete_item))
        .route("/:news_id/like", post(like))
        .route("/:news_id/featured", post(toggle_featured))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> NewsItem {
        NewsItem {
            id: 3,
            club_id: 1,
            title: "Hackathon this Friday".to_string(),
            content: "Bring your laptops to the lab after class.".to_string(),
            author: "Arjun Sharma".to_string(),
            likes: 0,
            featured: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn news_update_message_carries_title_body_and_author() {
        let msg = news_update_message(&sample_item());
        assert!(msg.starts_with("NEW UPDATE"));
        assert!(msg.contains("Hackathon this Friday"));
        assert!(msg.contains("Bring your laptops"));
        assert!(msg.ends_with("- Arjun Sharma"));
    }

    #[test]
    fn announcement_message_marks_the_edit() {
        let msg = announcement_message(&sample_item());
        assert!(msg.starts_with("UPDATE EDITED"));
        assert!(msg.contains("Hackathon this Friday"));
    }
}
