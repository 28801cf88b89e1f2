//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};

use storefront_app::auth::Session;

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    /// Store the authenticated session for downstream handlers.
    fn insert_session(&mut self, session: Session);

    fn session_or_401(&self) -> Result<&Session, StatusError>;

    /// The session, provided its user is an administrator.
    fn admin_session_or_403(&self) -> Result<&Session, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn insert_session(&mut self, session: Session) {
        self.inject(session);
    }

    fn session_or_401(&self) -> Result<&Session, StatusError> {
        self.obtain::<Session>()
            .map_err(|_ignored| StatusError::unauthorized().brief("Authentication required"))
    }

    fn admin_session_or_403(&self) -> Result<&Session, StatusError> {
        let session = self.session_or_401()?;

        if !session.is_admin() {
            return Err(StatusError::forbidden().brief("Administrator access required"));
        }

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;

    use crate::test_helpers::{test_admin_session, test_session};

    use super::*;

    #[test]
    fn missing_session_is_unauthorized() {
        let depot = Depot::new();

        let error = depot.session_or_401().err();

        assert_eq!(error.map(|e| e.code), Some(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn inserted_session_is_returned() {
        let mut depot = Depot::new();
        let session = test_session();

        depot.insert_session(session.clone());

        assert_eq!(depot.session_or_401().ok(), Some(&session));
    }

    #[test]
    fn non_admin_session_is_forbidden() {
        let mut depot = Depot::new();

        depot.insert_session(test_session());

        let error = depot.admin_session_or_403().err();

        assert_eq!(error.map(|e| e.code), Some(StatusCode::FORBIDDEN));
    }

    #[test]
    fn admin_session_is_allowed() {
        let mut depot = Depot::new();

        depot.insert_session(test_admin_session());

        assert!(depot.admin_session_or_403().is_ok());
    }
}
