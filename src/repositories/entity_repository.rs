use bson::Document;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection};

use crate::{
    config::database::get_collection,
    membership::{
        entity_configs::{EntityConfig, EntityId},
        errors::MembershipError,
    },
    models::entity_model::Entity,
};

/// Store access for membership-managed entities. Collections are selected per
/// config, so this holds the client rather than one collection.
pub struct EntityRepository {
    client: Client,
}

impl EntityRepository {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn collection(&self, config: &EntityConfig) -> Result<Collection<Document>, MembershipError> {
        Ok(get_collection(&self.client, config.collection).await?)
    }

    fn primary_key_filter(config: &EntityConfig, id: &EntityId) -> Document {
        let mut filter = config.base_query_doc();
        filter.insert(config.fields.primary_key, id.to_bson());
        filter
    }

    pub async fn find_entity(
        &self,
        config: &'static EntityConfig,
        id: &EntityId,
    ) -> Result<Option<Entity>, MembershipError> {
        let collection = self.collection(config).await?;
        let filter = Self::primary_key_filter(config, id);
        match collection.find_one(filter).await? {
            Some(document) => Ok(Some(Entity::from_document(config, document)?)),
            None => Ok(None),
        }
    }

    /// Inserts the config-driven default document for a new entity.
    pub async fn insert_entity(
        &self,
        config: &'static EntityConfig,
        id: &EntityId,
    ) -> Result<Entity, MembershipError> {
        let collection = self.collection(config).await?;
        let document = Self::primary_key_filter(config, id);
        collection.insert_one(&document).await?;
        Ok(Entity::from_document(config, document)?)
    }

    /// Idempotent membership add via `$addToSet`; the store serializes
    /// concurrent updates to the same document.
    pub async fn add_member(
        &self,
        config: &'static EntityConfig,
        entity: &Entity,
        write_field: &str,
        user_id: ObjectId,
    ) -> Result<(), MembershipError> {
        let collection = self.collection(config).await?;
        let Some(key) = entity.primary_key_value(config.kind) else {
            return Err(MembershipError::NotFound);
        };
        collection
            .update_one(
                doc! { config.fields.primary_key: key },
                doc! { "$addToSet": { write_field: user_id } },
            )
            .await?;
        Ok(())
    }

    /// Idempotent membership removal via `$pull`.
    pub async fn remove_member(
        &self,
        config: &'static EntityConfig,
        entity: &Entity,
        write_field: &str,
        user_id: ObjectId,
    ) -> Result<(), MembershipError> {
        let collection = self.collection(config).await?;
        let Some(key) = entity.primary_key_value(config.kind) else {
            return Err(MembershipError::NotFound);
        };
        collection
            .update_one(
                doc! { config.fields.primary_key: key },
                doc! { "$pull": { write_field: user_id } },
            )
            .await?;
        Ok(())
    }
}
