//! Auth service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::warn;

use crate::{
    auth::{
        AuthServiceError, IssuedToken, NewUserToken, Session, TokenSecret, TokenUuid,
        TokenVersion, UserToken, format_token, parse_token, repository::PgAuthRepository,
        token_verifier, verifiers_match,
    },
    database::Db,
    domain::users::records::UserUuid,
};

#[derive(Debug, Clone)]
pub struct PgAuthService {
    db: Db,
    repository: PgAuthRepository,
}

impl PgAuthService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgAuthRepository::new(),
        }
    }

    /// Issue a new bearer token for the given user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthServiceError::NotFound`] for an unknown user, or a storage error.
    pub async fn issue_token(
        &self,
        user_uuid: UserUuid,
        expires_at: Option<Timestamp>,
    ) -> Result<IssuedToken, AuthServiceError> {
        let token_uuid = TokenUuid::new();
        let version = TokenVersion::V1;
        let secret = TokenSecret::generate();
        let token = format_token(token_uuid.into_uuid(), version, &secret);

        let token_hash = token_verifier(&token_uuid.into_uuid(), version, &user_uuid, &secret);

        let mut tx = self.db.begin().await?;

        let metadata = self
            .repository
            .create_user_token(
                &mut tx,
                NewUserToken {
                    uuid: token_uuid,
                    user_uuid,
                    version,
                    token_hash,
                    expires_at,
                },
            )
            .await?;

        tx.commit().await?;

        Ok(IssuedToken { token, metadata })
    }

    /// List all tokens for the given user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_tokens(&self, user: UserUuid) -> Result<Vec<UserToken>, AuthServiceError> {
        let mut tx = self.db.begin().await?;

        let tokens = self.repository.list_user_tokens(&mut tx, user).await?;

        tx.commit().await?;

        Ok(tokens)
    }

    /// Revoke a token. Returns `true` if the token was active.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn revoke_token(&self, token: TokenUuid) -> Result<bool, AuthServiceError> {
        let mut tx = self.db.begin().await?;

        let revoked = self.repository.revoke_token(&mut tx, token).await?;

        tx.commit().await?;

        Ok(revoked)
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Session, AuthServiceError> {
        let parsed = parse_token(bearer_token).map_err(|_| AuthServiceError::NotFound)?;

        let mut tx = self.db.begin().await?;

        let token = self
            .repository
            .find_active_token(&mut tx, parsed.token_uuid, parsed.version)
            .await?
            .ok_or(AuthServiceError::NotFound)?;

        let expected = token_verifier(
            &parsed.token_uuid,
            parsed.version,
            &token.user.uuid,
            &parsed.secret,
        );

        if !verifiers_match(&token.token_hash, &expected) {
            return Err(AuthServiceError::NotFound);
        }

        // Authentication does not depend on this write.
        if let Err(error) = self.repository.touch_token(&mut tx, token.token_uuid).await {
            warn!(%error, token = %token.token_uuid, "failed to record token use");
        }

        tx.commit().await?;

        Ok(Session {
            token_uuid: token.token_uuid,
            user: token.user,
            cart_merged: token.cart_merged_at.is_some(),
        })
    }

    async fn mark_cart_merged(&self, token: TokenUuid) -> Result<bool, AuthServiceError> {
        let mut tx = self.db.begin().await?;

        let marked = self.repository.mark_cart_merged(&mut tx, token).await?;

        tx.commit().await?;

        Ok(marked)
    }

    async fn release_cart_merge(&self, token: TokenUuid) -> Result<bool, AuthServiceError> {
        let mut tx = self.db.begin().await?;

        let released = self.repository.release_cart_merge(&mut tx, token).await?;

        tx.commit().await?;

        Ok(released)
    }
}

/// Bearer authentication and per-session flags.
#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolve a raw bearer token to a session.
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Session, AuthServiceError>;

    /// Record that this session's guest cart has been merged. Returns `false`
    /// if it was already recorded.
    async fn mark_cart_merged(&self, token: TokenUuid) -> Result<bool, AuthServiceError>;

    /// Undo [`AuthService::mark_cart_merged`] after a merge that added nothing.
    async fn release_cart_merge(&self, token: TokenUuid) -> Result<bool, AuthServiceError>;
}
