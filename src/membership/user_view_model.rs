use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::{
    models::{entity_model::MemberRef, user_model::{Enrollment, User}},
    repositories::user_repository::UserRepository,
};

/// Request-scoped projection of a member-list entry, ready for rendering or
/// export. Never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserViewModel {
    pub _id: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub last_logged_in_at: Option<DateTime<Utc>>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub invite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment: Option<Enrollment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_entity_admin: Option<bool>,
}

impl UserViewModel {
    fn empty() -> Self {
        UserViewModel {
            _id: None,
            email: None,
            first_name: None,
            last_name: None,
            last_logged_in_at: None,
            last_active_at: None,
            invite: false,
            enrollment: None,
            is_entity_admin: None,
        }
    }
}

/// Shapes a single member reference without any lookup: an unresolved email
/// becomes an invite row, a bare id becomes an id-only stub.
pub fn build(member: &MemberRef) -> UserViewModel {
    match member {
        MemberRef::Unresolved(email) => UserViewModel {
            email: Some(email.clone()),
            invite: true,
            ..UserViewModel::empty()
        },
        MemberRef::Resolved(id) => UserViewModel {
            _id: Some(id.to_hex()),
            ..UserViewModel::empty()
        },
    }
}

pub fn from_user(user: &User) -> UserViewModel {
    UserViewModel {
        _id: user._id.map(|id| id.to_hex()),
        email: Some(user.email.clone()),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        last_logged_in_at: user.last_logged_in,
        last_active_at: user.last_active,
        invite: false,
        enrollment: user.enrollment.clone(),
        is_entity_admin: None,
    }
}

/// Order-preserving merge of member references with their fetched documents.
/// Ids missing from `fetched` degrade to stubs.
pub fn assemble(members: &[MemberRef], fetched: &HashMap<ObjectId, User>) -> Vec<UserViewModel> {
    members
        .iter()
        .map(|member| match member {
            MemberRef::Resolved(id) => fetched
                .get(id)
                .map(from_user)
                .unwrap_or_else(|| build(member)),
            MemberRef::Unresolved(_) => build(member),
        })
        .collect()
}

/// Merges a member list with the outcome of its batched lookup. On a failed
/// batch fetch every element falls back to its best-effort individual shape
/// instead of failing the request.
fn resolve_batch(
    members: &[MemberRef],
    fetched: mongodb::error::Result<Vec<User>>,
) -> Vec<UserViewModel> {
    match fetched {
        Ok(users) => {
            let fetched: HashMap<ObjectId, User> = users
                .into_iter()
                .filter_map(|user| user._id.map(|id| (id, user)))
                .collect();
            assemble(members, &fetched)
        }
        Err(err) => {
            log::warn!("batched member lookup failed, degrading to stubs: {err}");
            members.iter().map(build).collect()
        }
    }
}

/// Resolves a whole member list in one batched query.
pub async fn build_batch(
    members: &[MemberRef],
    user_repository: &UserRepository,
) -> Vec<UserViewModel> {
    let ids: Vec<ObjectId> = members
        .iter()
        .filter_map(|member| match member {
            MemberRef::Resolved(id) => Some(*id),
            MemberRef::Unresolved(_) => None,
        })
        .collect();

    resolve_batch(members, user_repository.find_users_by_ids(&ids).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: ObjectId, email: &str) -> User {
        User {
            _id: Some(id),
            email: email.to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            last_logged_in: None,
            last_active: None,
            enrollment: None,
            staff_access: HashMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn unresolved_email_builds_an_invite() {
        let view = build(&MemberRef::Unresolved("email@x.com".to_string()));
        assert_eq!(view.email.as_deref(), Some("email@x.com"));
        assert!(view.invite);
        assert!(view._id.is_none());
        assert!(view.first_name.is_none());
    }

    #[test]
    fn resolved_id_without_document_builds_a_stub() {
        let id = ObjectId::new();
        let view = build(&MemberRef::Resolved(id));
        assert_eq!(view._id.as_deref(), Some(id.to_hex().as_str()));
        assert!(!view.invite);
        assert!(view.email.is_none());
    }

    #[test]
    fn assemble_preserves_input_order_and_length() {
        let id1 = ObjectId::new();
        let id2 = ObjectId::new();
        let members = vec![
            MemberRef::Resolved(id1),
            MemberRef::Unresolved("email@x.com".to_string()),
            MemberRef::Resolved(id2),
        ];
        let mut fetched = HashMap::new();
        fetched.insert(id1, user(id1, "resolved@x.com"));

        let views = assemble(&members, &fetched);
        assert_eq!(views.len(), 3);

        assert_eq!(views[0]._id.as_deref(), Some(id1.to_hex().as_str()));
        assert_eq!(views[0].email.as_deref(), Some("resolved@x.com"));
        assert!(!views[0].invite);

        assert_eq!(views[1].email.as_deref(), Some("email@x.com"));
        assert!(views[1].invite);

        assert_eq!(views[2]._id.as_deref(), Some(id2.to_hex().as_str()));
        assert!(views[2].email.is_none());
        assert!(views[2].first_name.is_none());
        assert!(!views[2].invite);
    }

    #[test]
    fn failed_batch_lookup_degrades_every_element() {
        let id1 = ObjectId::new();
        let id2 = ObjectId::new();
        let members = vec![
            MemberRef::Resolved(id1),
            MemberRef::Unresolved("email@x.com".to_string()),
            MemberRef::Resolved(id2),
        ];

        let views = resolve_batch(
            &members,
            Err(mongodb::error::Error::custom("lookup offline".to_string())),
        );
        assert_eq!(views.len(), 3);

        assert_eq!(views[0]._id.as_deref(), Some(id1.to_hex().as_str()));
        assert!(views[0].email.is_none());
        assert!(!views[0].invite);

        assert_eq!(views[1].email.as_deref(), Some("email@x.com"));
        assert!(views[1]._id.is_none());
        assert!(views[1].invite);

        assert_eq!(views[2]._id.as_deref(), Some(id2.to_hex().as_str()));
        assert!(views[2].email.is_none());
        assert!(!views[2].invite);
    }

    #[test]
    fn duplicate_references_produce_duplicate_rows() {
        let id = ObjectId::new();
        let members = vec![MemberRef::Resolved(id), MemberRef::Resolved(id)];
        let mut fetched = HashMap::new();
        fetched.insert(id, user(id, "dup@x.com"));

        let views = assemble(&members, &fetched);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0], views[1]);
    }
}
