use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Group SSO linkage inside a user's enrollment record.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SsoLinkage {
    #[serde(rename = "groupId")]
    pub group_id: ObjectId,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Enrollment {
    #[serde(rename = "managedBy", skip_serializing_if = "Option::is_none")]
    pub managed_by: Option<ObjectId>,

    #[serde(rename = "enrolledAt", skip_serializing_if = "Option::is_none")]
    pub enrolled_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sso: Option<Vec<SsoLinkage>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(default)]
    pub _id: Option<ObjectId>,

    pub email: String,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    #[serde(rename = "lastLoggedIn", default)]
    pub last_logged_in: Option<DateTime<Utc>>,

    #[serde(rename = "lastActive", default)]
    pub last_active: Option<DateTime<Utc>>,

    #[serde(default)]
    pub enrollment: Option<Enrollment>,

    #[serde(rename = "staffAccess", default)]
    pub staff_access: HashMap<String, bool>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}
