use crate::constants::USER_COL_NAME;
use crate::{config::database::get_collection, models::user_model::User};
use futures_util::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection, error::Result};

pub struct UserRepository {
    pub collection: Collection<User>,
}

impl UserRepository {
    pub async fn new(client: &Client) -> Result<Self> {
        let collection = get_collection(client, (*USER_COL_NAME).as_str()).await?;
        Ok(Self { collection })
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.collection.find_one(doc! { "email": email }).await
    }

    /// One batched lookup for all ids, with the fixed members-page projection.
    pub async fn find_users_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids } })
            .projection(doc! {
                "email": 1,
                "first_name": 1,
                "last_name": 1,
                "lastLoggedIn": 1,
                "lastActive": 1,
                "enrollment": 1,
            })
            .await?;
        let users: Vec<User> = cursor.try_collect().await?;
        Ok(users)
    }
}
