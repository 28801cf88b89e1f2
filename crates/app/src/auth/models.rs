//! Auth data models.

use jiff::Timestamp;

use crate::{
    auth::TokenVersion,
    domain::users::records::{UserRecord, UserUuid},
    uuids::TypedUuid,
};

/// Bearer Token UUID
pub type TokenUuid = TypedUuid<UserToken>;

/// Token metadata; never carries the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserToken {
    pub uuid: TokenUuid,
    pub user_uuid: UserUuid,
    pub version: TokenVersion,
    pub cart_merged_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
}

/// Token issuance result with the raw token, shown once.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub metadata: UserToken,
}

/// An authenticated request's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token_uuid: TokenUuid,
    pub user: UserRecord,

    /// Whether a guest cart has already been merged under this token.
    pub cart_merged: bool,
}

impl Session {
    #[must_use]
    pub fn user_uuid(&self) -> UserUuid {
        self.user.uuid
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.is_admin
    }
}

/// Token row joined with its owner during bearer authentication.
#[derive(Debug, Clone)]
pub(crate) struct ActiveToken {
    pub token_uuid: TokenUuid,
    pub version: TokenVersion,
    pub token_hash: String,
    pub cart_merged_at: Option<Timestamp>,
    pub user: UserRecord,
}

#[derive(Debug, Clone)]
pub(crate) struct NewUserToken {
    pub uuid: TokenUuid,
    pub user_uuid: UserUuid,
    pub version: TokenVersion,
    pub token_hash: String,
    pub expires_at: Option<Timestamp>,
}
