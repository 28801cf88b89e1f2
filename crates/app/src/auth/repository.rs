//! Auth repository.

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    auth::{ActiveToken, NewUserToken, TokenUuid, TokenVersion, UserToken},
    domain::users::records::{UserRecord, UserUuid},
};

const CREATE_USER_TOKEN_SQL: &str = include_str!("sql/create_user_token.sql");
const FIND_ACTIVE_TOKEN_SQL: &str = include_str!("sql/find_active_token.sql");
const TOUCH_TOKEN_SQL: &str = include_str!("sql/touch_token.sql");
const MARK_CART_MERGED_SQL: &str = include_str!("sql/mark_cart_merged.sql");
const RELEASE_CART_MERGE_SQL: &str = include_str!("sql/release_cart_merge.sql");
const LIST_USER_TOKENS_SQL: &str = include_str!("sql/list_user_tokens.sql");
const REVOKE_TOKEN_SQL: &str = include_str!("sql/revoke_token.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgAuthRepository;

impl PgAuthRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_user_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: NewUserToken,
    ) -> Result<UserToken, sqlx::Error> {
        query_as::<Postgres, UserToken>(CREATE_USER_TOKEN_SQL)
            .bind(token.uuid.into_uuid())
            .bind(token.user_uuid.into_uuid())
            .bind(token.version.as_i16())
            .bind(token.token_hash)
            .bind(token.expires_at.map(SqlxTimestamp::from))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_active_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token_uuid: Uuid,
        version: TokenVersion,
    ) -> Result<Option<ActiveToken>, sqlx::Error> {
        query_as::<Postgres, ActiveToken>(FIND_ACTIVE_TOKEN_SQL)
            .bind(token_uuid)
            .bind(version.as_i16())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn touch_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: TokenUuid,
    ) -> Result<(), sqlx::Error> {
        query(TOUCH_TOKEN_SQL)
            .bind(token.into_uuid())
            .execute(&mut **tx)
            .await
            .map(|_| ())
    }

    /// Returns `true` only for the call that set the marker.
    pub(crate) async fn mark_cart_merged(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: TokenUuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, Uuid>(MARK_CART_MERGED_SQL)
            .bind(token.into_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map(|marked| marked.is_some())
    }

    pub(crate) async fn release_cart_merge(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: TokenUuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, Uuid>(RELEASE_CART_MERGE_SQL)
            .bind(token.into_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map(|released| released.is_some())
    }

    pub(crate) async fn list_user_tokens(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<UserToken>, sqlx::Error> {
        query_as::<Postgres, UserToken>(LIST_USER_TOKENS_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn revoke_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: TokenUuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, Uuid>(REVOKE_TOKEN_SQL)
            .bind(token.into_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map(|revoked| revoked.is_some())
    }
}

fn try_get_version(row: &PgRow) -> Result<TokenVersion, sqlx::Error> {
    TokenVersion::try_from(row.try_get::<i16, _>("version")?).map_err(|e| {
        sqlx::Error::ColumnDecode {
            index: "version".to_string(),
            source: Box::new(e),
        }
    })
}

fn try_get_optional_timestamp(row: &PgRow, col: &str) -> Result<Option<Timestamp>, sqlx::Error> {
    Ok(row
        .try_get::<Option<SqlxTimestamp>, _>(col)?
        .map(SqlxTimestamp::to_jiff))
}

impl<'r> FromRow<'r, PgRow> for UserToken {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: TokenUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            version: try_get_version(row)?,
            cart_merged_at: try_get_optional_timestamp(row, "cart_merged_at")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            last_used_at: try_get_optional_timestamp(row, "last_used_at")?,
            expires_at: try_get_optional_timestamp(row, "expires_at")?,
            revoked_at: try_get_optional_timestamp(row, "revoked_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for ActiveToken {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            token_uuid: TokenUuid::from_uuid(row.try_get("token_uuid")?),
            version: try_get_version(row)?,
            token_hash: row.try_get("token_hash")?,
            cart_merged_at: try_get_optional_timestamp(row, "cart_merged_at")?,
            user: UserRecord::from_row(row)?,
        })
    }
}
