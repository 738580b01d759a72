use super::{required, MIN_PASSWORD_LEN};
use crate::{
    auth::{self, Role},
    error::{AppError, AppResult},
    models::{Club, Member, MembershipStatus},
    schema::*,
    DbPool,
};
use axum::{routing::post, Extension, Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use scoped_futures::ScopedFutureExt;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClubRegisterRequest {
    pub slug: String,
    pub name: String,
    pub password: String,
    pub description: String,
    pub about: String,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub entry_fee: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClubLoginRequest {
    pub slug: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClubAuthorizedResponse {
    pub token: String,
}

impl ClubAuthorizedResponse {
    fn from_club(club: &Club) -> anyhow::Result<ClubAuthorizedResponse> {
        // expires after one day
        Ok(ClubAuthorizedResponse {
            token: auth::generate_jwt(club.id, Role::Admin, auth::SESSION_TTL)?,
        })
    }
}

async fn club_register(
    Extension(pool): Extension<DbPool>,
    Json(req): Json<ClubRegisterRequest>,
) -> AppResult<Json<ClubAuthorizedResponse>> {
    #[derive(Insertable)]
    #[diesel(table_name = clubs)]
    struct NewClub {
        slug: String,
        name: String,
        password_hash: String,
        description: String,
        about: String,
        activities: Vec<String>,
        entry_fee: i32,
        created_at: DateTime<Utc>,
    }

    #[derive(Insertable)]
    #[diesel(table_name = club_groups)]
    struct NewGroup {
        club_id: i32,
        club_name: String,
        is_active: bool,
    }

    required(&req.slug, "slug is required")?;
    required(&req.name, "name is required")?;
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation("password is too short"));
    }

    let ClubRegisterRequest {
        slug,
        name,
        password,
        description,
        about,
        activities,
        entry_fee,
    } = req;
    let password_hash = auth::hash_password(password)?;
    let conn = &mut pool.get().await?;

    // The club and its group chat are created together or not at all.
    let new_club = conn
        .transaction::<_, AppError, _>(|conn| {
            async move {
                let club = diesel::insert_into(clubs::table)
                    .values(NewClub {
                        slug: slug.trim().to_lowercase(),
                        name: name.trim().to_string(),
                        password_hash,
                        description,
                        about,
                        activities,
                        entry_fee,
                        created_at: Utc::now(),
                    })
                    .on_conflict(clubs::slug)
                    .do_nothing()
                    .get_result::<Club>(conn)
                    .await
                    .optional()?;

                let Some(club) = club else {
                    return Err(AppError::conflict("the club slug has been taken"));
                };

                diesel::insert_into(club_groups::table)
                    .values(NewGroup {
                        club_id: club.id,
                        club_name: club.name.clone(),
                        is_active: true,
                    })
                    .execute(conn)
                    .await?;

                Ok(club)
            }
            .scope_boxed()
        })
        .await?;

    Ok(Json(ClubAuthorizedResponse::from_club(&new_club)?))
}

async fn club_login(
    Extension(pool): Extension<DbPool>,
    Json(req): Json<ClubLoginRequest>,
) -> AppResult<Json<ClubAuthorizedResponse>> {
    let conn = &mut pool.get().await?;

    if let Some(club) = clubs::table
        .filter(clubs::slug.eq(req.slug.trim().to_lowercase()))
        .first::<Club>(conn)
        .await
        .optional()?
    {
        if auth::verify_password(req.password, &club.password_hash)? {
            return Ok(Json(ClubAuthorizedResponse::from_club(&club)?));
        }
    }
    Err(AppError::auth("invalid club or password"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberRegisterRequest {
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub section: String,
    pub roll_no: String,
    pub password: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// When set, the new member immediately joins this club.
    pub club_id: Option<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberLoginRequest {
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub section: String,
    pub roll_no: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MemberProfile {
    pub id: i32,
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub section: String,
    pub roll_no: String,
}

impl From<&Member> for MemberProfile {
    fn from(member: &Member) -> Self {
        MemberProfile {
            id: member.id,
            name: member.name.clone(),
            class_name: member.class_name.clone(),
            section: member.section.clone(),
            roll_no: member.roll_no.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MemberAuthorizedResponse {
    pub token: String,
    pub member: MemberProfile,
}

impl MemberAuthorizedResponse {
    fn from_member(member: &Member) -> anyhow::Result<MemberAuthorizedResponse> {
        // expires after one day
        Ok(MemberAuthorizedResponse {
            token: auth::generate_jwt(member.id, Role::Member, auth::SESSION_TTL)?,
            member: MemberProfile::from(member),
        })
    }
}

async fn member_register(
    Extension(pool): Extension<DbPool>,
    Json(req): Json<MemberRegisterRequest>,
) -> AppResult<Json<MemberAuthorizedResponse>> {
    #[derive(Insertable)]
    #[diesel(table_name = members)]
    struct NewMember {
        name: String,
        class_name: String,
        section: String,
        roll_no: String,
        password_hash: String,
        email: Option<String>,
        phone: Option<String>,
        is_active: bool,
        created_at: DateTime<Utc>,
    }

    #[derive(Insertable)]
    #[diesel(table_name = club_memberships)]
    struct NewMembership {
        member_id: i32,
        club_id: i32,
        club_name: String,
        status: String,
        joined_at: DateTime<Utc>,
    }

    required(&req.name, "name is required")?;
    required(&req.class_name, "class is required")?;
    required(&req.section, "section is required")?;
    required(&req.roll_no, "roll number is required")?;
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation("password is too short"));
    }

    let MemberRegisterRequest {
        name,
        class_name,
        section,
        roll_no,
        password,
        email,
        phone,
        club_id,
    } = req;
    let name = name.trim().to_string();
    let class_name = class_name.trim().to_string();
    let section = section.trim().to_uppercase();
    let roll_no = roll_no.trim().to_string();

    let conn = &mut pool.get().await?;

    // (name, class, section, roll number) identifies one member
    let already_registered = members::table
        .filter(members::name.eq(&name))
        .filter(members::class_name.eq(&class_name))
        .filter(members::section.eq(&section))
        .filter(members::roll_no.eq(&roll_no))
        .first::<Member>(conn)
        .await
        .optional()?;
    if already_registered.is_some() {
        return Err(AppError::conflict("this student is already registered"));
    }

    let password_hash = auth::hash_password(password)?;

    let new_member = conn
        .transaction::<_, AppError, _>(|conn| {
            async move {
                let member = diesel::insert_into(members::table)
                    .values(NewMember {
                        name,
                        class_name,
                        section,
                        roll_no,
                        password_hash,
                        email: email.filter(|e| !e.trim().is_empty()),
                        phone: phone.filter(|p| !p.trim().is_empty()),
                        is_active: true,
                        created_at: Utc::now(),
                    })
                    .get_result::<Member>(conn)
                    .await?;

                if let Some(club_id) = club_id {
                    let club = clubs::table
                        .find(club_id)
                        .first::<Club>(conn)
                        .await
                        .optional()?
                        .ok_or_else(|| AppError::not_found("the club does not exist"))?;

                    diesel::insert_into(club_memberships::table)
                        .values(NewMembership {
                            member_id: member.id,
                            club_id: club.id,
                            club_name: club.name,
                            status: MembershipStatus::Active.as_str().to_string(),
                            joined_at: Utc::now(),
                        })
                        .execute(conn)
                        .await?;
                }

                Ok(member)
            }
            .scope_boxed()
        })
        .await?;

    Ok(Json(MemberAuthorizedResponse::from_member(&new_member)?))
}

async fn member_login(
    Extension(pool): Extension<DbPool>,
    Json(req): Json<MemberLoginRequest>,
) -> AppResult<Json<MemberAuthorizedResponse>> {
    let conn = &mut pool.get().await?;

    if let Some(member) = members::table
        .filter(members::name.eq(req.name.trim()))
        .filter(members::class_name.eq(req.class_name.trim()))
        .filter(members::section.eq(req.section.trim().to_uppercase()))
        .filter(members::roll_no.eq(req.roll_no.trim()))
        .filter(members::is_active.eq(true))
        .first::<Member>(conn)
        .await
        .optional()?
    {
        if auth::verify_password(req.password, &member.password_hash)? {
            return Ok(Json(MemberAuthorizedResponse::from_member(&member)?));
        }
    }
    Err(AppError::auth("invalid login details"))
}

pub fn app() -> Router {
    Router::new()
        .route("/club/register", post(club_register))
        .route("/club/login", post(club_login))
        .route("/member/register", post(member_register))
        .route("/member/login", post(member_login))
}
