//! Auth middleware.

use std::sync::Arc;

use salvo::{http::header::AUTHORIZATION, prelude::*};
use tracing::error;

use storefront_app::auth::{AuthServiceError, Session};

use crate::{extensions::*, state::State};

/// Resolves the bearer token into a session, or stops the request with 401.
///
/// Routes mounted under this hoop can rely on `session_or_401` succeeding.
#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let token = bearer_token(req).map(ToOwned::to_owned);

    match resolve_session(token.as_deref(), depot).await {
        Ok(session) => {
            tracing::Span::current()
                .record("user_uuid", tracing::field::display(session.user_uuid()));

            depot.insert_session(session);

            ctrl.call_next(req, depot, res).await;
        }
        Err(status) => {
            res.render(status);
            ctrl.skip_rest();
        }
    }
}

async fn resolve_session(token: Option<&str>, depot: &Depot) -> Result<Session, StatusError> {
    let token = token.ok_or_else(|| {
        StatusError::unauthorized().brief("Missing or invalid Authorization header")
    })?;

    let state = depot.obtain_or_500::<Arc<State>>()?;

    state
        .app
        .auth
        .authenticate_bearer(token)
        .await
        .map_err(|error| match error {
            AuthServiceError::NotFound => StatusError::unauthorized().brief("Invalid API token"),
            AuthServiceError::Sql(source) => {
                error!("failed to look up api token: {source}");

                StatusError::internal_server_error()
            }
            AuthServiceError::Token(source) => {
                error!("failed to verify api token: {source}");

                StatusError::internal_server_error()
            }
        })
}

/// `Authorization: Bearer <token>`, scheme matched case-insensitively.
fn bearer_token(req: &Request) -> Option<&str> {
    let (scheme, token) = req
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .split_once(' ')?;

    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
