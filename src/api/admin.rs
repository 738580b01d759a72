use super::notify_group;
use crate::{
    auth::{self, AdminAuth},
    email,
    error::{AppError, AppResult},
    models::{
        Member, MembershipStatus, MessageKind, Registration, RegistrationStatus, SenderKind,
    },
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
use diesel_async::{AsyncConnection, RunQueryDsl};
use scoped_futures::ScopedFutureExt;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegistrationResponse {
    pub id: i32,
    pub club_id: i32,
    pub club_name: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub section: String,
    pub roll_no: String,
    pub phone: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Registration> for RegistrationResponse {
    fn from(r: Registration) -> Self {
        RegistrationResponse {
            id: r.id,
            club_id: r.club_id,
            club_name: r.club_name,
            name: r.name,
            email: r.email,
            class_name: r.class_name,
            section: r.section,
            roll_no: r.roll_no,
            phone: r.phone,
            status: r.status,
            created_at: r.created_at,
        }
    }
}

async fn list_registrations(
    Extension(pool): Extension<DbPool>,
    AdminAuth(club_id): AdminAuth,
) -> AppResult<Json<Vec<RegistrationResponse>>> {
    let conn = &mut pool.get().await?;

    let registrations = club_registrations::table
        .filter(club_registrations::club_id.eq(club_id))
        .order(club_registrations::created_at.desc())
        .load::<Registration>(conn)
        .await?;

    Ok(Json(
        registrations
            .into_iter()
            .map(RegistrationResponse::from)
            .collect(),
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Decision {
    Approved,
    Rejected,
}

#[derive(Deserialize)]
struct DecideRequest {
    decision: Decision,
}

/// Default credential for a freshly approved member: the lowercased name
/// without spaces followed by the roll number. A usability shortcut, not a
/// security-sound default; members are told to change it after first login.
fn default_password(name: &str, roll_no: &str) -> String {
    let compact: String = name.to_lowercase().split_whitespace().collect();
    format!("{compact}{roll_no}")
}

fn welcome_message(member_name: &str, club_name: &str) -> String {
    format!("Welcome {member_name} to {club_name}! We're excited to have you as a new member.")
}

fn credentials_email(registration: &Registration, password: &str) -> String {
    format!(
        r#"Hi {},

Your request to join {} has been approved! You can now log in to the member dashboard with your name, class, section and roll number, using the temporary password "{}". Please change it after your first login.

Thanks,
The XClubs Team."#,
        registration.name, registration.club_name, password,
    )
}

/// Decide a pending registration.
///
/// Rejection only flips the status. Approval flips the status, creates the
/// member with a default password and links a membership, all in one
/// transaction; the status write is conditional on the row still being
/// pending, so two admins racing on the same registration cannot both
/// provision a member. The welcome chat message and the credentials email
/// run after commit and are allowed to fail.
async fn decide_registration(
    Extension(pool): Extension<DbPool>,
    Path(registration_id): Path<i32>,
    AdminAuth(club_id): AdminAuth,
    Json(req): Json<DecideRequest>,
) -> AppResult<Json<RegistrationResponse>> {
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

    let conn = &mut pool.get().await?;

    let registration = club_registrations::table
        .find(registration_id)
        .first::<Registration>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::not_found("the registration does not exist"))?;

    if registration.club_id != club_id {
        return Err(AppError::auth("the registration belongs to another club"));
    }

    let decided = match req.decision {
        Decision::Rejected => diesel::update(
            club_registrations::table
                .find(registration.id)
                .filter(club_registrations::status.eq(RegistrationStatus::Pending.as_str())),
        )
        .set(club_registrations::status.eq(RegistrationStatus::Rejected.as_str()))
        .get_result::<Registration>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::conflict("the registration has already been decided"))?,

        Decision::Approved => {
            let password = default_password(&registration.name, &registration.roll_no);
            let new_member = NewMember {
                name: registration.name.clone(),
                class_name: registration.class_name.clone(),
                section: registration.section.clone(),
                roll_no: registration.roll_no.clone(),
                password_hash: auth::hash_password(&password)?,
                email: Some(registration.email.clone()),
                phone: registration.phone.clone(),
                is_active: true,
                created_at: Utc::now(),
            };
            let reg_id = registration.id;
            let member_club_id = registration.club_id;
            let member_club_name = registration.club_name.clone();

            let approved = conn
                .transaction::<_, AppError, _>(|conn| {
                    async move {
                        let updated = diesel::update(
                            club_registrations::table.find(reg_id).filter(
                                club_registrations::status
                                    .eq(RegistrationStatus::Pending.as_str()),
                            ),
                        )
                        .set(
                            club_registrations::status
                                .eq(RegistrationStatus::Approved.as_str()),
                        )
                        .get_result::<Registration>(conn)
                        .await
                        .optional()?
                        .ok_or_else(|| {
                            AppError::conflict("the registration has already been decided")
                        })?;

                        let member = diesel::insert_into(members::table)
                            .values(new_member)
                            .get_result::<Member>(conn)
                            .await?;

                        diesel::insert_into(club_memberships::table)
                            .values(NewMembership {
                                member_id: member.id,
                                club_id: member_club_id,
                                club_name: member_club_name,
                                status: MembershipStatus::Active.as_str().to_string(),
                                joined_at: Utc::now(),
                            })
                            .execute(conn)
                            .await?;

                        Ok(updated)
                    }
                    .scope_boxed()
                })
                .await?;

            if let Err(e) = notify_group(
                conn,
                registration.club_id,
                "System".to_string(),
                SenderKind::System,
                welcome_message(&registration.name, &registration.club_name),
                MessageKind::System,
                None,
            )
            .await
            {
                tracing::warn!("failed to post welcome message: {e:#}");
            }

            if email::is_configured() {
                if let Err(e) = email::send(
                    &registration.name,
                    &registration.email,
                    "Your club registration was approved",
                    credentials_email(&registration, &password),
                )
                .await
                {
                    tracing::warn!("failed to send approval email: {e:#}");
                }
            }

            approved
        }
    };

    Ok(Json(RegistrationResponse::from(decided)))
}

pub fn app() -> Router {
    Router::new()
        .route("/registrations", get(list_registrations))
        .route("/registrations/:registration_id/decide", post(decide_registration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_password_compacts_name_and_appends_roll() {
        assert_eq!(default_password("Rahul Verma", "08"), "rahulverma08");
        assert_eq!(default_password("  Priya  Patel ", "12"), "priyapatel12");
        assert_eq!(default_password("Arjun", "1"), "arjun1");
    }

    #[test]
    fn welcome_message_mentions_member_and_club() {
        let msg = welcome_message("Rahul Verma", "X Code");
        assert!(msg.contains("Rahul Verma"));
        assert!(msg.contains("X Code"));
    }

    #[test]
    fn credentials_email_contains_the_temporary_password() {
        let registration = Registration {
            id: 1,
            club_id: 1,
            club_name: "X Code".to_string(),
            name: "Rahul Verma".to_string(),
            email: "rahul@example.com".to_string(),
            class_name: "11".to_string(),
            section: "A".to_string(),
            roll_no: "08".to_string(),
            phone: None,
            status: RegistrationStatus::Pending.as_str().to_string(),
            created_at: Utc::now(),
        };

        let body = credentials_email(&registration, "rahulverma08");
        assert!(body.contains("rahulverma08"));
        assert!(body.contains("X Code"));
    }

    #[test]
    fn decisions_deserialize_from_lowercase_only() {
        let req: DecideRequest = serde_json::from_str(r#"{"decision":"approved"}"#).unwrap();
        assert_eq!(req.decision, Decision::Approved);
        let req: DecideRequest = serde_json::from_str(r#"{"decision":"rejected"}"#).unwrap();
        assert_eq!(req.decision, Decision::Rejected);
        assert!(serde_json::from_str::<DecideRequest>(r#"{"decision":"pending"}"#).is_err());
    }
}
