use crate::schema::*;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a join request. The only legal transitions are
/// pending -> approved and pending -> rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Active,
    Inactive,
    Banned,
}

impl MembershipStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Inactive => "inactive",
            MembershipStatus::Banned => "banned",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    Member,
    Admin,
    System,
}

impl SenderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SenderKind::Member => "member",
            SenderKind::Admin => "admin",
            SenderKind::System => "system",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    NewsUpdate,
    Announcement,
    System,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::NewsUpdate => "news_update",
            MessageKind::Announcement => "announcement",
            MessageKind::System => "system",
        }
    }
}

#[derive(Debug, Clone, Queryable, Identifiable)]
pub struct Club {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub password_hash: String,
    pub description: String,
    pub about: String,
    pub activities: Vec<String>,
    pub entry_fee: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(Club))]
#[diesel(table_name = club_registrations)]
pub struct Registration {
    pub id: i32,
    pub club_id: i32,
    pub club_name: String,
    pub name: String,
    pub email: String,
    pub class_name: String,
    pub section: String,
    pub roll_no: String,
    pub phone: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
pub struct Member {
    pub id: i32,
    pub name: String,
    pub class_name: String,
    pub section: String,
    pub roll_no: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(Club))]
#[diesel(belongs_to(Member))]
#[diesel(table_name = club_memberships)]
pub struct Membership {
    pub id: i32,
    pub member_id: i32,
    pub club_id: i32,
    pub club_name: String,
    pub status: String,
    pub joined_at: DateTime<Utc>,
}

/// The per-club message channel, 1:1 with a club.
#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(Club))]
#[diesel(table_name = club_groups)]
pub struct Group {
    pub id: i32,
    pub club_id: i32,
    pub club_name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(Group))]
#[diesel(table_name = group_messages)]
pub struct Message {
    pub id: i32,
    pub group_id: i32,
    pub sender_id: Option<i32>,
    pub sender_name: String,
    pub sender_type: String,
    pub message_text: String,
    pub message_type: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// The message log is append-only, so there is no changeset for this table.
#[derive(Debug, Insertable)]
#[diesel(table_name = group_messages)]
pub struct NewMessage {
    pub group_id: i32,
    pub sender_id: Option<i32>,
    pub sender_name: String,
    pub sender_type: String,
    pub message_text: String,
    pub message_type: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(Club))]
#[diesel(table_name = news)]
pub struct NewsItem {
    pub id: i32,
    pub club_id: i32,
    pub title: String,
    pub content: String,
    pub author: String,
    pub likes: i32,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_match_stored_values() {
        assert_eq!(RegistrationStatus::Pending.as_str(), "pending");
        assert_eq!(RegistrationStatus::Approved.as_str(), "approved");
        assert_eq!(RegistrationStatus::Rejected.as_str(), "rejected");
        assert_eq!(MembershipStatus::Active.as_str(), "active");
        assert_eq!(MembershipStatus::Banned.as_str(), "banned");
        assert_eq!(SenderKind::System.as_str(), "system");
        assert_eq!(MessageKind::NewsUpdate.as_str(), "news_update");
        assert_eq!(MessageKind::Announcement.as_str(), "announcement");
    }

    #[test]
    fn decision_statuses_deserialize_from_lowercase() {
        let approved: RegistrationStatus = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(approved, RegistrationStatus::Approved);
        let rejected: RegistrationStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(rejected, RegistrationStatus::Rejected);
        assert!(serde_json::from_str::<RegistrationStatus>("\"banned\"").is_err());
    }
}
