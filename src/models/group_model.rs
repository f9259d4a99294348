use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Pending team invite held on the group document.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TeamInvite {
    pub email: String,
}

/// Group subscription, backed by the `subscriptions` collection.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Group {
    #[serde(default)]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub admin_id: Option<ObjectId>,

    #[serde(default)]
    pub member_ids: Vec<ObjectId>,

    #[serde(default)]
    pub manager_ids: Vec<ObjectId>,

    #[serde(default)]
    pub invited_emails: Vec<String>,

    #[serde(rename = "teamInvites", default)]
    pub team_invites: Vec<TeamInvite>,

    #[serde(rename = "teamName", default)]
    pub team_name: Option<String>,

    #[serde(rename = "membersLimit", default)]
    pub members_limit: Option<u32>,

    #[serde(rename = "managedUsersEnabled", default)]
    pub managed_users_enabled: bool,

    #[serde(rename = "ssoConfig", default)]
    pub sso_config: Option<ObjectId>,

    #[serde(rename = "groupPlan", default)]
    pub group_plan: bool,
}
