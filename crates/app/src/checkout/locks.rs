//! Per-user checkout guard.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{checkout::CheckoutError, domain::users::records::UserUuid};

/// Tracks users with a checkout in flight in this process.
#[derive(Debug, Clone, Default)]
pub struct CheckoutLocks {
    active: Arc<Mutex<HashSet<UserUuid>>>,
}

impl CheckoutLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the checkout slot for `user` until the guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::CheckoutInProgress`] if the slot is taken.
    pub fn acquire(&self, user: UserUuid) -> Result<CheckoutGuard, CheckoutError> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);

        if !active.insert(user) {
            return Err(CheckoutError::CheckoutInProgress);
        }

        Ok(CheckoutGuard {
            active: Arc::clone(&self.active),
            user,
        })
    }

    #[must_use]
    pub fn is_active(&self, user: UserUuid) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&user)
    }
}

#[derive(Debug)]
pub struct CheckoutGuard {
    active: Arc<Mutex<HashSet<UserUuid>>>,
    user: UserUuid,
}

impl Drop for CheckoutGuard {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.user);
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn second_checkout_for_same_user_is_refused() -> TestResult {
        let locks = CheckoutLocks::new();
        let user = UserUuid::new();

        let _guard = locks.acquire(user)?;

        assert!(matches!(
            locks.acquire(user),
            Err(CheckoutError::CheckoutInProgress)
        ));
        assert!(locks.acquire(UserUuid::new()).is_ok());

        Ok(())
    }

    #[test]
    fn dropping_the_guard_releases_the_user() -> TestResult {
        let locks = CheckoutLocks::new();
        let user = UserUuid::new();

        drop(locks.acquire(user)?);

        assert!(!locks.is_active(user));
        assert!(locks.acquire(user).is_ok());

        Ok(())
    }
}
