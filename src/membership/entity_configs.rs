use bson::{Bson, doc, oid::ObjectId};
use std::str::FromStr;
use strum_macros::{Display, EnumString};

use crate::membership::errors::MembershipError;

/// Entity kinds whose membership this service manages. Route segments parse
/// into this enum; an unparseable segment means "unknown entity kind".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum EntityKind {
    Group,
    GroupManagers,
    Institution,
    Publisher,
}

/// Syntax of the route id for an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSyntax {
    ObjectIdHex,
    Numeric,
    Slug,
}

/// A validated route id, ready to be used as a primary-key query value.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityId {
    Object(ObjectId),
    Numeric(i32),
    Slug(String),
}

impl EntityId {
    pub fn to_bson(&self) -> Bson {
        match self {
            EntityId::Object(oid) => Bson::ObjectId(*oid),
            EntityId::Numeric(n) => Bson::Int32(*n),
            EntityId::Slug(slug) => Bson::String(slug.clone()),
        }
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityId::Object(oid) => write!(f, "{}", oid.to_hex()),
            EntityId::Numeric(n) => write!(f, "{}", n),
            EntityId::Slug(slug) => write!(f, "{}", slug),
        }
    }
}

/// Field names the membership pipeline touches on the backing document.
#[derive(Debug)]
pub struct EntityFields {
    pub primary_key: &'static str,
    pub id_syntax: IdSyntax,
    /// Member-list fields shown on the members page, in declaration order.
    pub read: &'static [&'static str],
    /// Member-list field mutated by add/remove. `None` marks a read-only kind.
    pub write: Option<&'static str>,
    pub access: &'static str,
    pub name: Option<&'static str>,
}

/// Static, behavior-free description of one entity kind. Path building lives
/// in [`build_paths`] so this stays plain data.
#[derive(Debug)]
pub struct EntityConfig {
    pub kind: EntityKind,
    pub model_name: &'static str,
    pub collection: &'static str,
    pub fields: EntityFields,
    pub read_only: bool,
    pub has_members_limit: bool,
    /// Extra filter pairs merged into every primary-key query.
    pub base_query: &'static [(&'static str, bool)],
    /// Staff capability that grants management access for this kind.
    pub staff_capability: &'static str,
}

impl EntityConfig {
    pub fn base_query_doc(&self) -> bson::Document {
        let mut query = doc! {};
        for (field, value) in self.base_query {
            query.insert(*field, *value);
        }
        query
    }

    /// Validates a raw route id against this kind's id syntax.
    pub fn parse_id(&self, raw: &str) -> Result<EntityId, MembershipError> {
        match self.fields.id_syntax {
            IdSyntax::ObjectIdHex => ObjectId::parse_str(raw)
                .map(EntityId::Object)
                .map_err(|_| MembershipError::InvalidEntityId(raw.to_string())),
            IdSyntax::Numeric => i32::from_str(raw)
                .map(EntityId::Numeric)
                .map_err(|_| MembershipError::InvalidEntityId(raw.to_string())),
            IdSyntax::Slug => {
                if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                    Err(MembershipError::InvalidEntityId(raw.to_string()))
                } else {
                    Ok(EntityId::Slug(raw.to_string()))
                }
            }
        }
    }
}

static GROUP_CONFIG: EntityConfig = EntityConfig {
    kind: EntityKind::Group,
    model_name: "Subscription",
    collection: "subscriptions",
    fields: EntityFields {
        primary_key: "_id",
        id_syntax: IdSyntax::ObjectIdHex,
        read: &["invited_emails", "teamInvites", "member_ids"],
        write: None,
        access: "manager_ids",
        name: Some("teamName"),
    },
    read_only: true,
    has_members_limit: true,
    base_query: &[("groupPlan", true)],
    staff_capability: "groupManagement",
};

static GROUP_MANAGERS_CONFIG: EntityConfig = EntityConfig {
    kind: EntityKind::GroupManagers,
    model_name: "Subscription",
    collection: "subscriptions",
    fields: EntityFields {
        primary_key: "_id",
        id_syntax: IdSyntax::ObjectIdHex,
        read: &["manager_ids"],
        write: Some("manager_ids"),
        access: "manager_ids",
        name: None,
    },
    read_only: false,
    has_members_limit: false,
    base_query: &[("groupPlan", true)],
    staff_capability: "groupManagement",
};

static INSTITUTION_CONFIG: EntityConfig = EntityConfig {
    kind: EntityKind::Institution,
    model_name: "Institution",
    collection: "institutions",
    fields: EntityFields {
        primary_key: "v1Id",
        id_syntax: IdSyntax::Numeric,
        read: &["managerIds"],
        write: Some("managerIds"),
        access: "managerIds",
        name: Some("name"),
    },
    read_only: false,
    has_members_limit: false,
    base_query: &[],
    staff_capability: "institutionManagement",
};

static PUBLISHER_CONFIG: EntityConfig = EntityConfig {
    kind: EntityKind::Publisher,
    model_name: "Publisher",
    collection: "publishers",
    fields: EntityFields {
        primary_key: "slug",
        id_syntax: IdSyntax::Slug,
        read: &["managerIds"],
        write: Some("managerIds"),
        access: "managerIds",
        name: Some("name"),
    },
    read_only: false,
    has_members_limit: false,
    base_query: &[],
    staff_capability: "publisherManagement",
};

impl EntityKind {
    pub fn config(self) -> &'static EntityConfig {
        match self {
            EntityKind::Group => &GROUP_CONFIG,
            EntityKind::GroupManagers => &GROUP_MANAGERS_CONFIG,
            EntityKind::Institution => &INSTITUTION_CONFIG,
            EntityKind::Publisher => &PUBLISHER_CONFIG,
        }
    }
}

/// Looks up the config for a route segment. `None` means unknown entity kind
/// and must be answered with a 404.
pub fn entity_config(kind: &str) -> Option<&'static EntityConfig> {
    EntityKind::from_str(kind).ok().map(EntityKind::config)
}

/// Route paths for one entity instance.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSet {
    pub index: String,
    pub export: Option<String>,
}

pub fn build_paths(kind: EntityKind, id: &EntityId) -> PathSet {
    match kind {
        EntityKind::Group => PathSet {
            index: format!("/manage/groups/{id}/members"),
            export: Some(format!("/manage/groups/{id}/members/export")),
        },
        EntityKind::GroupManagers => PathSet {
            index: format!("/manage/groups/{id}/managers"),
            export: None,
        },
        EntityKind::Institution => PathSet {
            index: format!("/manage/institutions/{id}/managers"),
            export: None,
        },
        EntityKind::Publisher => PathSet {
            index: format!("/manage/publishers/{id}/managers"),
            export: None,
        },
    }
}

/// Staff-only creation route for kinds that support on-demand creation.
pub fn build_create_path(kind: EntityKind, id: &EntityId) -> String {
    format!("/entities/{kind}/create/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_known_kinds() {
        assert_eq!(entity_config("group").unwrap().model_name, "Subscription");
        assert_eq!(
            entity_config("groupManagers").unwrap().fields.write,
            Some("manager_ids")
        );
        assert_eq!(
            entity_config("institution").unwrap().fields.primary_key,
            "v1Id"
        );
        assert_eq!(entity_config("publisher").unwrap().fields.primary_key, "slug");
    }

    #[test]
    fn unknown_kind_yields_none() {
        assert!(entity_config("project").is_none());
        assert!(entity_config("").is_none());
    }

    #[test]
    fn group_is_read_only_with_members_limit() {
        let config = entity_config("group").unwrap();
        assert!(config.read_only);
        assert!(config.has_members_limit);
        assert!(config.fields.write.is_none());
    }

    #[test]
    fn parses_ids_per_kind() {
        let oid = ObjectId::new();
        assert_eq!(
            GROUP_CONFIG.parse_id(&oid.to_hex()).unwrap(),
            EntityId::Object(oid)
        );
        assert!(GROUP_CONFIG.parse_id("not-an-object-id").is_err());

        assert_eq!(
            INSTITUTION_CONFIG.parse_id("123").unwrap(),
            EntityId::Numeric(123)
        );
        assert!(INSTITUTION_CONFIG.parse_id("abc").is_err());

        assert_eq!(
            PUBLISHER_CONFIG.parse_id("some-publisher").unwrap(),
            EntityId::Slug("some-publisher".to_string())
        );
        assert!(PUBLISHER_CONFIG.parse_id("bad slug!").is_err());
    }

    #[test]
    fn builds_paths_by_kind() {
        let id = EntityId::Numeric(123);
        assert_eq!(
            build_paths(EntityKind::Institution, &id).index,
            "/manage/institutions/123/managers"
        );
        assert_eq!(
            build_create_path(EntityKind::Institution, &id),
            "/entities/institution/create/123"
        );

        let oid = ObjectId::new();
        let id = EntityId::Object(oid);
        let paths = build_paths(EntityKind::Group, &id);
        assert_eq!(paths.index, format!("/manage/groups/{}/members", oid.to_hex()));
        assert_eq!(
            paths.export.unwrap(),
            format!("/manage/groups/{}/members/export", oid.to_hex())
        );
    }

    #[test]
    fn base_query_merges_into_lookups() {
        assert_eq!(GROUP_CONFIG.base_query_doc(), doc! { "groupPlan": true });
        assert_eq!(INSTITUTION_CONFIG.base_query_doc(), doc! {});
    }
}
