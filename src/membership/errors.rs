use thiserror::Error;

/// Error taxonomy for the membership pipeline. Business-rule variants are
/// translated to machine-readable payloads at the handler boundary; the rest
/// map onto 404/403/400, and `Database` bubbles up as a generic 500.
#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("no user found for the given email")]
    UserNotFound,

    #[error("user is already a member of the entity")]
    UserAlreadyAdded,

    #[error("the entity admin cannot be removed")]
    UserIsManager,

    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    #[error("invalid entity id: {0}")]
    InvalidEntityId(String),

    #[error(transparent)]
    Database(#[from] mongodb::error::Error),

    #[error("malformed entity document: {0}")]
    Decode(#[from] bson::de::Error),
}
