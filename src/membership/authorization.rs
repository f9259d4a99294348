use crate::{
    membership::{entity_configs::EntityKind, errors::MembershipError},
    models::entity_model::Entity,
    utils::auth_utils::SessionUser,
};

/// Capabilities granted to each admin role. Looked up by
/// `Predicate::AdminCapability`; roles missing from the table grant nothing.
static ADMIN_CAPABILITIES: &[(&str, &[&str])] = &[
    ("admin", &["view-entity", "modify-entity", "create-entity"]),
    ("support", &["view-entity"]),
];

fn admin_role_capabilities(role: &str) -> &'static [&'static str] {
    ADMIN_CAPABILITIES
        .iter()
        .find(|(name, _)| *name == role)
        .map(|(_, caps)| *caps)
        .unwrap_or(&[])
}

/// One authorization check. All predicates are pure and fail closed.
#[derive(Debug, Clone, Copy)]
pub enum Predicate {
    /// Requester's id appears in the entity's access list.
    EntityAccess,
    /// Requester's staff-access map has the named capability set.
    StaffAccess(&'static str),
    /// One of the requester's admin roles grants the named capability. The
    /// strict form ignores the blanket "admin" role.
    AdminCapability(&'static str, bool),
}

/// What the predicates get to look at for one request.
pub struct AuthContext<'a> {
    pub session: Option<&'a SessionUser>,
    pub entity: Option<&'a Entity>,
    pub kind: EntityKind,
}

pub fn evaluate(predicate: Predicate, ctx: &AuthContext<'_>) -> bool {
    match predicate {
        Predicate::EntityAccess => has_entity_access(ctx),
        Predicate::StaffAccess(capability) => has_staff_access(ctx, capability),
        Predicate::AdminCapability(capability, strict) => {
            has_admin_capability(ctx, capability, strict)
        }
    }
}

fn has_entity_access(ctx: &AuthContext<'_>) -> bool {
    let (Some(session), Some(entity)) = (ctx.session, ctx.entity) else {
        return false;
    };
    entity
        .access_refs(ctx.kind)
        .iter()
        .any(|id| *id == session.user_id)
}

fn has_staff_access(ctx: &AuthContext<'_>, capability: &str) -> bool {
    if capability.is_empty() {
        return false;
    }
    ctx.session
        .map(|session| session.staff_access.get(capability).copied().unwrap_or(false))
        .unwrap_or(false)
}

fn has_admin_capability(ctx: &AuthContext<'_>, capability: &str, strict: bool) -> bool {
    let Some(session) = ctx.session else {
        return false;
    };
    session.admin_roles.iter().any(|role| {
        if !strict && role == "admin" {
            return true;
        }
        admin_role_capabilities(role).contains(&capability)
    })
}

/// Evaluates predicates left to right, short-circuiting on the first that
/// grants access. All false means Forbidden.
pub fn allow_access_if_any(
    predicates: &[Predicate],
    ctx: &AuthContext<'_>,
) -> Result<(), MembershipError> {
    for predicate in predicates {
        if evaluate(*predicate, ctx) {
            log::debug!("access granted by {:?}", predicate);
            return Ok(());
        }
    }
    Err(MembershipError::Forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;
    use std::collections::HashMap;

    use crate::models::group_model::Group;

    fn session_for(user_id: ObjectId) -> SessionUser {
        SessionUser {
            user_id,
            staff_access: HashMap::new(),
            admin_roles: Vec::new(),
        }
    }

    fn group_with_manager(manager_id: ObjectId) -> Entity {
        Entity::Group(Group {
            _id: Some(ObjectId::new()),
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
        })
    }

    #[test]
    fn entity_access_matches_access_list_membership() {
        let manager = ObjectId::new();
        let entity = group_with_manager(manager);

        let session = session_for(manager);
        let ctx = AuthContext {
            session: Some(&session),
            entity: Some(&entity),
            kind: EntityKind::GroupManagers,
        };
        assert!(evaluate(Predicate::EntityAccess, &ctx));

        let outsider = session_for(ObjectId::new());
        let ctx = AuthContext {
            session: Some(&outsider),
            entity: Some(&entity),
            kind: EntityKind::GroupManagers,
        };
        assert!(!evaluate(Predicate::EntityAccess, &ctx));
    }

    #[test]
    fn entity_access_fails_closed_without_entity_or_session() {
        let manager = ObjectId::new();
        let session = session_for(manager);
        let ctx = AuthContext {
            session: Some(&session),
            entity: None,
            kind: EntityKind::GroupManagers,
        };
        assert!(!evaluate(Predicate::EntityAccess, &ctx));

        let entity = group_with_manager(manager);
        let ctx = AuthContext {
            session: None,
            entity: Some(&entity),
            kind: EntityKind::GroupManagers,
        };
        assert!(!evaluate(Predicate::EntityAccess, &ctx));
    }

    #[test]
    fn staff_access_requires_truthy_capability() {
        let mut session = session_for(ObjectId::new());
        session
            .staff_access
            .insert("institutionManagement".to_string(), true);
        session.staff_access.insert("groupManagement".to_string(), false);

        let ctx = AuthContext {
            session: Some(&session),
            entity: None,
            kind: EntityKind::Institution,
        };
        assert!(evaluate(Predicate::StaffAccess("institutionManagement"), &ctx));
        assert!(!evaluate(Predicate::StaffAccess("groupManagement"), &ctx));
        assert!(!evaluate(Predicate::StaffAccess("publisherManagement"), &ctx));
        assert!(!evaluate(Predicate::StaffAccess(""), &ctx));
    }

    #[test]
    fn admin_capability_respects_strictness() {
        let mut session = session_for(ObjectId::new());
        session.admin_roles.push("support".to_string());

        let ctx = AuthContext {
            session: Some(&session),
            entity: None,
            kind: EntityKind::Group,
        };
        assert!(evaluate(Predicate::AdminCapability("view-entity", true), &ctx));
        assert!(!evaluate(Predicate::AdminCapability("modify-entity", true), &ctx));

        let mut admin_session = session_for(ObjectId::new());
        admin_session.admin_roles.push("admin".to_string());
        let ctx = AuthContext {
            session: Some(&admin_session),
            entity: None,
            kind: EntityKind::Group,
        };
        assert!(evaluate(Predicate::AdminCapability("anything", false), &ctx));
        assert!(!evaluate(Predicate::AdminCapability("anything", true), &ctx));
    }

    #[test]
    fn allow_access_if_any_short_circuits_and_fails_closed() {
        let manager = ObjectId::new();
        let entity = group_with_manager(manager);
        let session = session_for(manager);
        let ctx = AuthContext {
            session: Some(&session),
            entity: Some(&entity),
            kind: EntityKind::GroupManagers,
        };

        allow_access_if_any(
            &[Predicate::StaffAccess("groupManagement"), Predicate::EntityAccess],
            &ctx,
        )
        .unwrap();

        let err = allow_access_if_any(&[Predicate::StaffAccess("groupManagement")], &ctx)
            .unwrap_err();
        assert!(matches!(err, MembershipError::Forbidden));

        let err = allow_access_if_any(&[], &ctx).unwrap_err();
        assert!(matches!(err, MembershipError::Forbidden));
    }
}
