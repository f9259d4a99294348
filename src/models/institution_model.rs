use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Institution record, keyed by its numeric v1 id.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Institution {
    #[serde(default)]
    pub _id: Option<ObjectId>,

    #[serde(rename = "v1Id")]
    pub v1_id: i32,

    #[serde(rename = "managerIds", default)]
    pub manager_ids: Vec<ObjectId>,

    #[serde(default)]
    pub name: Option<String>,
}
