use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Publisher record, keyed by its slug.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Publisher {
    #[serde(default)]
    pub _id: Option<ObjectId>,

    pub slug: String,

    #[serde(rename = "managerIds", default)]
    pub manager_ids: Vec<ObjectId>,

    #[serde(default)]
    pub name: Option<String>,
}
