use bson::oid::ObjectId;
use log::info;
use std::sync::Arc;

use crate::{
    membership::{
        entity_configs::{EntityConfig, EntityId},
        errors::MembershipError,
        user_view_model::{self, UserViewModel},
    },
    models::entity_model::Entity,
    repositories::{entity_repository::EntityRepository, user_repository::UserRepository},
};

pub struct MembershipService {
    pub entity_repository: Arc<EntityRepository>,
    pub user_repository: Arc<UserRepository>,
}

/// Flags every resolved row whose id matches the entity's admin reference.
fn mark_entity_admin(users: &mut [UserViewModel], admin_id: Option<ObjectId>) {
    let Some(admin_id) = admin_id else {
        return;
    };
    let admin_hex = admin_id.to_hex();
    for user in users {
        if user._id.as_deref() == Some(admin_hex.as_str()) {
            user.is_entity_admin = Some(true);
        }
    }
}

/// Duplicate-add precondition, checked before the store write.
fn ensure_not_already_added(
    entity: &Entity,
    config: &EntityConfig,
    user_id: ObjectId,
) -> Result<(), MembershipError> {
    if entity.write_member_ids(config.kind).contains(&user_id) {
        Err(MembershipError::UserAlreadyAdded)
    } else {
        Ok(())
    }
}

/// The entity admin cannot be removed through the membership list. Runs
/// before the mutation regardless of list contents.
fn ensure_not_entity_admin(entity: &Entity, user_id: ObjectId) -> Result<(), MembershipError> {
    if entity.admin_id() == Some(user_id) {
        Err(MembershipError::UserIsManager)
    } else {
        Ok(())
    }
}

impl MembershipService {
    pub fn new(
        entity_repository: Arc<EntityRepository>,
        user_repository: Arc<UserRepository>,
    ) -> Self {
        Self {
            entity_repository,
            user_repository,
        }
    }

    /// Resolves every member list of the entity into view models, in
    /// field-declaration order, without deduplication.
    pub async fn get_users(
        &self,
        entity: &Entity,
        config: &'static EntityConfig,
    ) -> Result<Vec<UserViewModel>, MembershipError> {
        let members = entity.read_member_refs(config.kind);
        let mut users = user_view_model::build_batch(&members, &self.user_repository).await;
        mark_entity_admin(&mut users, entity.admin_id());
        Ok(users)
    }

    pub async fn add_user(
        &self,
        entity: &Entity,
        config: &'static EntityConfig,
        email: &str,
    ) -> Result<UserViewModel, MembershipError> {
        let write_field = config.fields.write.ok_or(MembershipError::NotFound)?;

        let user = self
            .user_repository
            .find_user_by_email(email)
            .await?
            .ok_or(MembershipError::UserNotFound)?;
        let user_id = user._id.ok_or(MembershipError::UserNotFound)?;

        ensure_not_already_added(entity, config, user_id)?;

        self.entity_repository
            .add_member(config, entity, write_field, user_id)
            .await?;
        info!("added user {} to {} {}", user_id, config.kind, config.model_name);

        Ok(user_view_model::from_user(&user))
    }

    pub async fn remove_user(
        &self,
        entity: &Entity,
        config: &'static EntityConfig,
        user_id: ObjectId,
    ) -> Result<(), MembershipError> {
        ensure_not_entity_admin(entity, user_id)?;

        let write_field = config.fields.write.ok_or(MembershipError::NotFound)?;
        self.entity_repository
            .remove_member(config, entity, write_field, user_id)
            .await?;
        info!("removed user {} from {} {}", user_id, config.kind, config.model_name);
        Ok(())
    }

    /// Inserts the config-driven default document for the entity.
    pub async fn create_entity(
        &self,
        id: &EntityId,
        config: &'static EntityConfig,
    ) -> Result<Entity, MembershipError> {
        let entity = self.entity_repository.insert_entity(config, id).await?;
        info!("created {} {}", config.model_name, id);
        Ok(entity)
    }

    /// Plain primary-key read. Callers own the authorization step; the name
    /// makes that contract explicit.
    pub async fn get_entity_without_authorization_check(
        &self,
        id: &EntityId,
        config: &'static EntityConfig,
    ) -> Result<Option<Entity>, MembershipError> {
        self.entity_repository.find_entity(config, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::entity_configs::EntityKind;
    use crate::models::entity_model::MemberRef;
    use crate::models::group_model::Group;

    fn group_entity(admin_id: ObjectId, manager_ids: Vec<ObjectId>) -> Entity {
        Entity::Group(Group {
            _id: Some(ObjectId::new()),
            admin_id: Some(admin_id),
            member_ids: vec![],
            manager_ids,
            invited_emails: vec![],
            team_invites: vec![],
            team_name: None,
            members_limit: None,
            managed_users_enabled: false,
            sso_config: None,
            group_plan: true,
        })
    }

    #[test]
    fn admin_rows_are_flagged_after_resolution() {
        let admin_id = ObjectId::new();
        let other_id = ObjectId::new();
        let mut users = vec![
            user_view_model::build(&MemberRef::Resolved(admin_id)),
            user_view_model::build(&MemberRef::Resolved(other_id)),
            user_view_model::build(&MemberRef::Unresolved("a@b.co".to_string())),
        ];

        mark_entity_admin(&mut users, Some(admin_id));
        assert_eq!(users[0].is_entity_admin, Some(true));
        assert_eq!(users[1].is_entity_admin, None);
        assert_eq!(users[2].is_entity_admin, None);

        mark_entity_admin(&mut users, None);
        assert_eq!(users[1].is_entity_admin, None);
    }

    #[test]
    fn duplicate_add_is_rejected_before_any_write() {
        let member = ObjectId::new();
        let entity = group_entity(ObjectId::new(), vec![member]);
        let config = EntityKind::GroupManagers.config();

        let err = ensure_not_already_added(&entity, config, member).unwrap_err();
        assert!(matches!(err, MembershipError::UserAlreadyAdded));

        ensure_not_already_added(&entity, config, ObjectId::new()).unwrap();
    }

    #[test]
    fn admin_removal_is_rejected_even_when_not_in_write_list() {
        let admin_id = ObjectId::new();
        // Admin is not in manager_ids, the guard must still fire.
        let entity = group_entity(admin_id, vec![ObjectId::new()]);

        let err = ensure_not_entity_admin(&entity, admin_id).unwrap_err();
        assert!(matches!(err, MembershipError::UserIsManager));

        ensure_not_entity_admin(&entity, ObjectId::new()).unwrap();
    }
}
