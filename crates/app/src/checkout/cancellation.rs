//! Checkout cancellation.

use tokio::sync::watch;

use crate::checkout::CheckoutError;

/// Cancels the checkout attempt it was created with.
#[derive(Debug)]
pub struct CancelCheckout {
    tx: watch::Sender<bool>,
}

impl CancelCheckout {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// One cancellation signal per checkout attempt. It is only consulted before
/// payment is captured.
#[derive(Debug, Clone)]
pub struct CheckoutCancellation {
    rx: watch::Receiver<bool>,
}

impl CheckoutCancellation {
    #[must_use]
    pub fn channel() -> (CancelCheckout, Self) {
        let (tx, rx) = watch::channel(false);

        (CancelCheckout { tx }, Self { rx })
    }

    /// A signal that never fires.
    #[must_use]
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);

        Self { rx }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// # Errors
    ///
    /// Returns [`CheckoutError::Cancelled`] once the signal has fired.
    pub fn check(&self) -> Result<(), CheckoutError> {
        if self.is_cancelled() {
            Err(CheckoutError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolves when the signal fires; pends forever if it never can.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();

        loop {
            if *rx.borrow_and_update() {
                return;
            }

            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn cancel_wakes_waiters() {
        let (handle, cancellation) = CheckoutCancellation::channel();

        assert!(cancellation.check().is_ok());

        let waiter = {
            let cancellation = cancellation.clone();
            tokio::spawn(async move { cancellation.cancelled().await })
        };

        handle.cancel();

        assert!(
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .is_ok()
        );
        assert!(matches!(cancellation.check(), Err(CheckoutError::Cancelled)));
    }

    #[tokio::test]
    async fn never_does_not_fire() {
        let cancellation = CheckoutCancellation::never();

        let fired = tokio::time::timeout(Duration::from_millis(20), cancellation.cancelled()).await;

        assert!(fired.is_err());
        assert!(!cancellation.is_cancelled());
    }
}
