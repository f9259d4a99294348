use bson::{Bson, Document, oid::ObjectId};

use crate::{
    membership::entity_configs::{EntityConfig, EntityKind},
    models::{group_model::Group, institution_model::Institution, publisher_model::Publisher},
};

/// One element of a member list. Built at the store-decoding boundary so the
/// rest of the pipeline never shape-sniffs raw documents.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberRef {
    /// A user account id.
    Resolved(ObjectId),
    /// An invite that only names an email, no account yet.
    Unresolved(String),
}

/// A membership-managed record. The variant plus the requesting kind select
/// which fields the accessors below read, replacing the string-keyed field
/// indirection of the configs.
#[derive(Debug, Clone)]
pub enum Entity {
    Group(Group),
    Institution(Institution),
    Publisher(Publisher),
}

impl Entity {
    pub fn from_document(config: &EntityConfig, doc: Document) -> bson::de::Result<Entity> {
        match config.kind {
            EntityKind::Group | EntityKind::GroupManagers => {
                bson::from_document(doc).map(Entity::Group)
            }
            EntityKind::Institution => bson::from_document(doc).map(Entity::Institution),
            EntityKind::Publisher => bson::from_document(doc).map(Entity::Publisher),
        }
    }

    /// Value of the entity's primary key for the given kind.
    pub fn primary_key_value(&self, kind: EntityKind) -> Option<Bson> {
        match (kind, self) {
            (EntityKind::Group | EntityKind::GroupManagers, Entity::Group(group)) => {
                group._id.map(Bson::ObjectId)
            }
            (EntityKind::Institution, Entity::Institution(institution)) => {
                Some(Bson::Int32(institution.v1_id))
            }
            (EntityKind::Publisher, Entity::Publisher(publisher)) => {
                Some(Bson::String(publisher.slug.clone()))
            }
            _ => None,
        }
    }

    /// Ids that confer management access for the given kind. Always a list,
    /// even where the backing field would be a scalar.
    pub fn access_refs(&self, kind: EntityKind) -> Vec<ObjectId> {
        match (kind, self) {
            (EntityKind::Group | EntityKind::GroupManagers, Entity::Group(group)) => {
                group.manager_ids.clone()
            }
            (EntityKind::Institution, Entity::Institution(institution)) => {
                institution.manager_ids.clone()
            }
            (EntityKind::Publisher, Entity::Publisher(publisher)) => {
                publisher.manager_ids.clone()
            }
            _ => Vec::new(),
        }
    }

    /// Member lists shown for the given kind, flattened in field-declaration
    /// order. A member appearing in several lists appears several times;
    /// callers must not deduplicate.
    pub fn read_member_refs(&self, kind: EntityKind) -> Vec<MemberRef> {
        match (kind, self) {
            (EntityKind::Group, Entity::Group(group)) => {
                let mut refs: Vec<MemberRef> = group
                    .invited_emails
                    .iter()
                    .cloned()
                    .map(MemberRef::Unresolved)
                    .collect();
                refs.extend(
                    group
                        .team_invites
                        .iter()
                        .map(|invite| MemberRef::Unresolved(invite.email.clone())),
                );
                refs.extend(group.member_ids.iter().copied().map(MemberRef::Resolved));
                refs
            }
            (EntityKind::GroupManagers, Entity::Group(group)) => {
                group.manager_ids.iter().copied().map(MemberRef::Resolved).collect()
            }
            (EntityKind::Institution, Entity::Institution(institution)) => {
                institution.manager_ids.iter().copied().map(MemberRef::Resolved).collect()
            }
            (EntityKind::Publisher, Entity::Publisher(publisher)) => {
                publisher.manager_ids.iter().copied().map(MemberRef::Resolved).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Current contents of the writable member list for the given kind.
    pub fn write_member_ids(&self, kind: EntityKind) -> Vec<ObjectId> {
        match (kind, self) {
            (EntityKind::GroupManagers, Entity::Group(group)) => group.manager_ids.clone(),
            (EntityKind::Institution, Entity::Institution(institution)) => {
                institution.manager_ids.clone()
            }
            (EntityKind::Publisher, Entity::Publisher(publisher)) => {
                publisher.manager_ids.clone()
            }
            _ => Vec::new(),
        }
    }

    /// The owning admin, where the kind has one.
    pub fn admin_id(&self) -> Option<ObjectId> {
        match self {
            Entity::Group(group) => group.admin_id,
            _ => None,
        }
    }

    pub fn members_limit(&self) -> Option<u32> {
        match self {
            Entity::Group(group) => group.members_limit,
            _ => None,
        }
    }

    pub fn managed_users_enabled(&self) -> bool {
        match self {
            Entity::Group(group) => group.managed_users_enabled,
            _ => false,
        }
    }

    pub fn sso_config_id(&self) -> Option<ObjectId> {
        match self {
            Entity::Group(group) => group.sso_config,
            _ => None,
        }
    }

    pub fn group_id(&self) -> Option<ObjectId> {
        match self {
            Entity::Group(group) => group._id,
            _ => None,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            Entity::Group(group) => group.team_name.as_deref(),
            Entity::Institution(institution) => institution.name.as_deref(),
            Entity::Publisher(publisher) => publisher.name.as_deref(),
        }
    }
}
