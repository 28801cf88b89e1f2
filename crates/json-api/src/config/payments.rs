//! Payments Config

use clap::Args;

use storefront_app::{
    checkout::{CheckoutConfig, DEFAULT_SIMULATED_PAYMENT_METHOD},
    payments::PaymentsConfig,
    pricing::PricingError,
};

/// Payment processor and checkout settings.
#[derive(Args)]
pub struct PaymentsSettings {
    /// Payment processor API base URL
    #[arg(long, env = "PAYMENT_API_BASE", default_value = "https://api.stripe.com")]
    pub payment_api_base: String,

    /// Payment processor secret key
    #[arg(long, env = "PAYMENT_SECRET_KEY", hide_env_values = true)]
    pub payment_secret_key: String,

    /// ISO 4217 currency every checkout is charged in
    #[arg(long, env = "CHECKOUT_CURRENCY", default_value = "usd")]
    pub checkout_currency: String,

    /// Confirm intents server-side with a test payment method
    #[arg(
        long,
        env = "SIMULATE_PAYMENT_CONFIRMATION",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub simulate_payment_confirmation: bool,

    /// Payment method used for simulated confirmation
    #[arg(
        long,
        env = "SIMULATED_PAYMENT_METHOD",
        default_value = DEFAULT_SIMULATED_PAYMENT_METHOD
    )]
    pub simulated_payment_method: String,
}

impl PaymentsSettings {
    /// Payment processor client settings.
    #[must_use]
    pub fn payments_config(&self) -> PaymentsConfig {
        PaymentsConfig {
            api_base: self.payment_api_base.clone(),
            secret_key: self.payment_secret_key.clone(),
        }
    }

    /// Checkout settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the checkout currency is not a known ISO code.
    pub fn checkout_config(&self) -> Result<CheckoutConfig, PricingError> {
        Ok(CheckoutConfig::new(&self.checkout_currency)?
            .with_simulated_confirmation(self.simulate_payment_confirmation)
            .with_simulated_payment_method(self.simulated_payment_method.clone()))
    }
}

impl std::fmt::Debug for PaymentsSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentsSettings")
            .field("payment_api_base", &self.payment_api_base)
            .field("payment_secret_key", &"**redacted**")
            .field("checkout_currency", &self.checkout_currency)
            .field(
                "simulate_payment_confirmation",
                &self.simulate_payment_confirmation,
            )
            .field("simulated_payment_method", &self.simulated_payment_method)
            .finish()
    }
}
