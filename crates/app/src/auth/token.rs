//! Bearer token formatting, parsing, and verifier hashing.
//!
//! Tokens look like `sf_v1_{token uuid}.{secret hex}`. Only a SHA-256 digest
//! of the verifier input is ever stored.

use std::{fmt, fmt::Write as _, str::FromStr};

use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::domain::users::records::UserUuid;

/// Bearer token prefix.
pub const TOKEN_PREFIX: &str = "sf";

/// Number of random secret bytes carried by a token.
pub const TOKEN_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenVersion {
    V1,
}

impl TokenVersion {
    #[must_use]
    pub const fn as_i16(self) -> i16 {
        match self {
            Self::V1 => 1,
        }
    }

    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::V1 => "v1",
        }
    }
}

impl TryFrom<i16> for TokenVersion {
    type Error = TokenError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::V1),
            _ => Err(TokenError::UnsupportedVersion),
        }
    }
}

impl FromStr for TokenVersion {
    type Err = TokenError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "v1" => Ok(Self::V1),
            _ => Err(TokenError::UnsupportedVersion),
        }
    }
}

/// Random token secret; wiped from memory on drop.
#[derive(Clone)]
pub struct TokenSecret([u8; TOKEN_SECRET_BYTES]);

impl TokenSecret {
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_SECRET_BYTES];

        OsRng.fill_bytes(&mut bytes);

        Self(bytes)
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; TOKEN_SECRET_BYTES]) -> Self {
        Self(bytes)
    }

    fn to_hex(&self) -> String {
        self.0
            .iter()
            .fold(String::with_capacity(TOKEN_SECRET_BYTES * 2), |mut out, byte| {
                let _infallible = write!(out, "{byte:02x}");
                out
            })
    }

    fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != TOKEN_SECRET_BYTES * 2 || !hex.is_ascii() {
            return None;
        }

        let mut bytes = [0_u8; TOKEN_SECRET_BYTES];

        for (index, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(hex.get(index * 2..index * 2 + 2)?, 16).ok()?;
        }

        Some(Self(bytes))
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSecret(**redacted**)")
    }
}

impl Drop for TokenSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[derive(Debug, Clone)]
pub struct ParsedToken {
    pub token_uuid: Uuid,
    pub version: TokenVersion,
    pub secret: TokenSecret,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token format is invalid")]
    InvalidFormat,

    #[error("token uses an unsupported version")]
    UnsupportedVersion,

    #[error("token secret encoding is invalid")]
    InvalidSecretEncoding,
}

#[must_use]
pub fn format_token(token_uuid: Uuid, version: TokenVersion, secret: &TokenSecret) -> String {
    format!(
        "{TOKEN_PREFIX}_{}_{}.{}",
        version.segment(),
        token_uuid.simple(),
        secret.to_hex()
    )
}

/// Split a raw bearer token into its parts.
///
/// # Errors
///
/// Returns a [`TokenError`] describing the first malformed segment.
pub fn parse_token(token: &str) -> Result<ParsedToken, TokenError> {
    let (id, secret) = token.split_once('.').ok_or(TokenError::InvalidFormat)?;

    let mut segments = id.splitn(3, '_');

    let (Some(TOKEN_PREFIX), Some(version), Some(token_uuid)) =
        (segments.next(), segments.next(), segments.next())
    else {
        return Err(TokenError::InvalidFormat);
    };

    Ok(ParsedToken {
        token_uuid: Uuid::try_parse(token_uuid).map_err(|_| TokenError::InvalidFormat)?,
        version: version.parse()?,
        secret: TokenSecret::from_hex(secret).ok_or(TokenError::InvalidSecretEncoding)?,
    })
}

/// Hex SHA-256 over `{token_uuid}:{version}:{user_uuid}:{secret}`.
///
/// Binding the user into the digest means a row moved to another user no
/// longer verifies.
#[must_use]
pub fn token_verifier(
    token_uuid: &Uuid,
    version: TokenVersion,
    user_uuid: &UserUuid,
    secret: &TokenSecret,
) -> String {
    let mut input = format!(
        "{}:{}:{}:{}",
        token_uuid.simple(),
        version.as_i16(),
        user_uuid.into_uuid().simple(),
        secret.to_hex(),
    );

    let digest = format!("{:x}", Sha256::digest(input.as_bytes()));

    input.zeroize();

    digest
}

/// Compare two verifiers without short-circuiting on the first difference.
#[must_use]
pub fn verifiers_match(expected: &str, actual: &str) -> bool {
    expected.len() == actual.len()
        && expected
            .bytes()
            .zip(actual.bytes())
            .fold(0_u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}
