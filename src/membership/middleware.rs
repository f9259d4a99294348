use crate::{
    membership::{
        authorization::{AuthContext, Predicate, allow_access_if_any},
        entity_configs::{EntityConfig, EntityId, build_create_path, entity_config},
        errors::MembershipError,
    },
    models::entity_model::Entity,
    repositories::entity_repository::EntityRepository,
    utils::auth_utils::SessionUser,
};

/// Everything the pipeline accumulates for one request.
pub struct RequestContext {
    pub config: &'static EntityConfig,
    pub raw_id: String,
    pub session: Option<SessionUser>,
    pub entity_id: Option<EntityId>,
    pub entity: Option<Entity>,
}

impl RequestContext {
    pub fn new(config: &'static EntityConfig, raw_id: String, session: Option<SessionUser>) -> Self {
        RequestContext {
            config,
            raw_id,
            session,
            entity_id: None,
            entity: None,
        }
    }
}

/// Ordered pipeline steps, all with the same outcome signature, interpreted
/// by [`run_pipeline`]. The first non-Continue outcome is terminal.
#[derive(Debug, Clone, Copy)]
pub enum Step<'a> {
    /// Validate the route id and attach the entity (possibly absent).
    FetchEntity,
    /// Missing entity redirects staff holding the capability to the creation
    /// route; everyone else gets NotFound.
    RequireEntityOrCreate(&'a str),
    /// Missing entity is a NotFound.
    RequireEntity,
    /// Authorization gate; all-false means Forbidden.
    Authorize(&'a [Predicate]),
}

pub enum StepOutcome {
    Continue,
    Redirect(String),
    Fail(MembershipError),
}

/// Resolves the route's entity-kind segment. Unknown kinds are NotFound.
pub fn fetch_entity_config(kind: &str) -> Result<&'static EntityConfig, MembershipError> {
    entity_config(kind).ok_or(MembershipError::NotFound)
}

async fn run_step(
    step: Step<'_>,
    ctx: &mut RequestContext,
    entity_repository: &EntityRepository,
) -> StepOutcome {
    match step {
        Step::FetchEntity => {
            let id = match ctx.config.parse_id(&ctx.raw_id) {
                Ok(id) => id,
                Err(err) => return StepOutcome::Fail(err),
            };
            match entity_repository.find_entity(ctx.config, &id).await {
                Ok(entity) => {
                    ctx.entity_id = Some(id);
                    ctx.entity = entity;
                    StepOutcome::Continue
                }
                Err(err) => StepOutcome::Fail(err),
            }
        }
        Step::RequireEntity => {
            if ctx.entity.is_some() {
                StepOutcome::Continue
            } else {
                StepOutcome::Fail(MembershipError::NotFound)
            }
        }
        Step::RequireEntityOrCreate(staff_capability) => {
            if ctx.entity.is_some() {
                return StepOutcome::Continue;
            }
            let holds_capability = ctx
                .session
                .as_ref()
                .map(|session| {
                    session
                        .staff_access
                        .get(staff_capability)
                        .copied()
                        .unwrap_or(false)
                })
                .unwrap_or(false);
            match (&ctx.entity_id, holds_capability) {
                (Some(id), true) => {
                    StepOutcome::Redirect(build_create_path(ctx.config.kind, id))
                }
                _ => StepOutcome::Fail(MembershipError::NotFound),
            }
        }
        Step::Authorize(predicates) => {
            let auth_ctx = AuthContext {
                session: ctx.session.as_ref(),
                entity: ctx.entity.as_ref(),
                kind: ctx.config.kind,
            };
            match allow_access_if_any(predicates, &auth_ctx) {
                Ok(()) => StepOutcome::Continue,
                Err(err) => StepOutcome::Fail(err),
            }
        }
    }
}

/// Interprets the steps strictly in order. `Ok(None)` means the request may
/// proceed to its handler; `Ok(Some(url))` is an early 302.
pub async fn run_pipeline(
    steps: &[Step<'_>],
    ctx: &mut RequestContext,
    entity_repository: &EntityRepository,
) -> Result<Option<String>, MembershipError> {
    for step in steps {
        match run_step(*step, ctx, entity_repository).await {
            StepOutcome::Continue => continue,
            StepOutcome::Redirect(url) => return Ok(Some(url)),
            StepOutcome::Fail(err) => return Err(err),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::entity_configs::EntityKind;
    use crate::models::group_model::Group;
    use bson::oid::ObjectId;
    use mongodb::{Client, options::ClientOptions};
    use std::collections::HashMap;

    // Client construction is lazy; no step in these tests touches the store.
    async fn offline_repository() -> EntityRepository {
        let options = ClientOptions::parse("mongodb://localhost:27017")
            .await
            .unwrap();
        EntityRepository::new(Client::with_options(options).unwrap())
    }

    fn staff_session(capability: &str) -> SessionUser {
        let mut staff_access = HashMap::new();
        staff_access.insert(capability.to_string(), true);
        SessionUser {
            user_id: ObjectId::new(),
            staff_access,
            admin_roles: Vec::new(),
        }
    }

    fn context_with_entity(manager_id: ObjectId) -> RequestContext {
        let entity_id = ObjectId::new();
        let mut ctx = RequestContext::new(
            EntityKind::GroupManagers.config(),
            entity_id.to_hex(),
            Some(SessionUser {
                user_id: manager_id,
                staff_access: HashMap::new(),
                admin_roles: Vec::new(),
            }),
        );
        ctx.entity_id = Some(EntityId::Object(entity_id));
        ctx.entity = Some(Entity::Group(Group {
            _id: Some(entity_id),
            admin_id: Some(ObjectId::new()),
            member_ids: vec![],
            manager_ids: vec![manager_id],
            invited_emails: vec![],
            team_invites: vec![],
            team_name: None,
            members_limit: None,
            managed_users_enabled: false,
            sso_config: None,
            group_plan: true,
        }));
        ctx
    }

    #[test]
    fn unknown_kind_is_not_found() {
        assert!(matches!(
            fetch_entity_config("project"),
            Err(MembershipError::NotFound)
        ));
        assert_eq!(
            fetch_entity_config("publisher").unwrap().model_name,
            "Publisher"
        );
    }

    #[actix_rt::test]
    async fn require_entity_fails_when_absent() {
        let repo = offline_repository().await;
        let mut ctx = RequestContext::new(
            EntityKind::GroupManagers.config(),
            ObjectId::new().to_hex(),
            None,
        );
        let err = run_pipeline(&[Step::RequireEntity], &mut ctx, &repo)
            .await
            .unwrap_err();
        assert!(matches!(err, MembershipError::NotFound));
    }

    #[actix_rt::test]
    async fn pipeline_stops_at_first_failure() {
        let repo = offline_repository().await;
        let mut ctx = RequestContext::new(
            EntityKind::GroupManagers.config(),
            ObjectId::new().to_hex(),
            None,
        );
        // Authorize would also fail, but RequireEntity fires first.
        let err = run_pipeline(
            &[Step::RequireEntity, Step::Authorize(&[Predicate::EntityAccess])],
            &mut ctx,
            &repo,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MembershipError::NotFound));
    }

    #[actix_rt::test]
    async fn manager_passes_require_and_authorize() {
        let repo = offline_repository().await;
        let manager = ObjectId::new();
        let mut ctx = context_with_entity(manager);
        let outcome = run_pipeline(
            &[Step::RequireEntity, Step::Authorize(&[Predicate::EntityAccess])],
            &mut ctx,
            &repo,
        )
        .await
        .unwrap();
        assert!(outcome.is_none());
    }

    #[actix_rt::test]
    async fn missing_entity_redirects_staff_to_creation_route() {
        let repo = offline_repository().await;
        let mut ctx = RequestContext::new(
            EntityKind::Institution.config(),
            "123".to_string(),
            Some(staff_session("institutionManagement")),
        );
        ctx.entity_id = Some(EntityId::Numeric(123));

        let outcome = run_pipeline(
            &[Step::RequireEntityOrCreate("institutionManagement")],
            &mut ctx,
            &repo,
        )
        .await
        .unwrap();
        assert_eq!(outcome.as_deref(), Some("/entities/institution/create/123"));
    }

    #[actix_rt::test]
    async fn missing_entity_without_capability_is_not_found() {
        let repo = offline_repository().await;
        let mut ctx = RequestContext::new(
            EntityKind::Institution.config(),
            "123".to_string(),
            None,
        );
        ctx.entity_id = Some(EntityId::Numeric(123));

        let err = run_pipeline(
            &[Step::RequireEntityOrCreate("institutionManagement")],
            &mut ctx,
            &repo,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MembershipError::NotFound));
    }
}
