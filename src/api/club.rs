use super::{admin::RegistrationResponse, required};
use crate::{
    error::{AppError, AppResult},
    models::{Club, Registration, RegistrationStatus},
    schema::*,
    DbPool,
};
use axum::{
    extract::Path,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClubResponse {
    id: i32,
    slug: String,
    name: String,
    description: String,
    about: String,
    activities: Vec<String>,
    entry_fee: i32,
}

impl From<Club> for ClubResponse {
    fn from(club: Club) -> Self {
        ClubResponse {
            id: club.id,
            slug: club.slug,
            name: club.name,
            description: club.description,
            about: club.about,
            activities: club.activities,
            entry_fee: club.entry_fee,
        }
    }
}

async fn list(Extension(pool): Extension<DbPool>) -> AppResult<Json<Vec<ClubResponse>>> {
    let conn = &mut pool.get().await?;

    let clubs = clubs::table
        .order(clubs::name.asc())
        .load::<Club>(conn)
        .await?;

    Ok(Json(clubs.into_iter().map(ClubResponse::from).collect()))
}

async fn info(
    Extension(pool): Extension<DbPool>,
    Path(club_slug): Path<String>,
) -> AppResult<Json<ClubResponse>> {
    let conn = &mut pool.get().await?;

    let club = clubs::table
        .filter(clubs::slug.eq(club_slug))
        .first::<Club>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found("the club does not exist"))?;

    Ok(Json(ClubResponse::from(club)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinRequest {
    pub name: String,
    pub email: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub section: String,
    pub roll_no: String,
    pub phone: Option<String>,
}

/// A prospective member asks to join a club. The request is stored as a
/// pending registration for the club's admin to decide on; nothing is sent
/// to the group chat at submission time.
async fn join(
    Extension(pool): Extension<DbPool>,
    Path(club_slug): Path<String>,
    Json(req): Json<JoinRequest>,
) -> AppResult<Json<RegistrationResponse>> {
    #[derive(Insertable)]
    #[diesel(table_name = club_registrations)]
    struct NewRegistration {
        club_id: i32,
        club_name: String,
        name: String,
        email: String,
        class_name: String,
        section: String,
        roll_no: String,
        phone: Option<String>,
        status: String,
        created_at: DateTime<Utc>,
    }

    required(&req.name, "name is required")?;
    required(&req.email, "email is required")?;
    required(&req.class_name, "class is required")?;
    required(&req.section, "section is required")?;
    required(&req.roll_no, "roll number is required")?;

    let conn = &mut pool.get().await?;

    let club = clubs::table
        .filter(clubs::slug.eq(club_slug))
        .first::<Club>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found("the club does not exist"))?;

    let registration = diesel::insert_into(club_registrations::table)
        .values(NewRegistration {
            club_id: club.id,
            club_name: club.name,
            name: req.name.trim().to_string(),
            email: req.email.trim().to_string(),
            class_name: req.class_name.trim().to_string(),
            section: req.section.trim().to_uppercase(),
            roll_no: req.roll_no.trim().to_string(),
            phone: req.phone.filter(|p| !p.trim().is_empty()),
            status: RegistrationStatus::Pending.as_str().to_string(),
            created_at: Utc::now(),
        })
        .get_result::<Registration>(conn)
        .await?;

    Ok(Json(RegistrationResponse::from(registration)))
}

pub fn app() -> Router {
    Router::new()
        .route("/list", get(list))
        .route("/info/:club_slug", get(info))
        .route("/:club_slug/join", post(join))
}
