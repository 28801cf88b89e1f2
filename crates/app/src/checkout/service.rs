//! Checkout orchestration.

use std::{collections::BTreeMap, sync::Arc};

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    checkout::{
        BillingSelection, CartTotalChanged, CheckoutCancellation, CheckoutError, CheckoutFailure,
        CheckoutLocks, CheckoutRequest, CheckoutResult, CheckoutState, PaymentMethodChoice,
        PendingPayment, Receipt, ShippingSelection, ValidatedCheckout,
    },
    domain::{
        addresses::{AddressesService, AddressesServiceError, data::Address, records::AddressUuid},
        carts::CartsService,
        orders::{
            OrdersService, OrdersServiceError,
            data::{NewOrder, NewOrderItem},
            records::{OrderItemUuid, OrderStatus, OrderUuid},
        },
        users::records::UserUuid,
    },
    payments::{
        NewPaymentIntent, PaymentIntent, PaymentIntentStatus, PaymentProcessor,
        USER_METADATA_KEY,
    },
    pricing::{PricingError, resolve_currency},
};

/// Test payment method used when confirmation is simulated.
pub const DEFAULT_SIMULATED_PAYMENT_METHOD: &str = "pm_card_visa";

/// Metadata key for the number of units in the cart at intent creation.
pub const ITEM_COUNT_METADATA_KEY: &str = "item_count";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    currency: String,
    simulate_confirmation: bool,
    simulated_payment_method: String,
}

impl CheckoutConfig {
    /// Checkout in a fixed currency, with simulated confirmation enabled.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::UnknownCurrency`] for an unknown ISO 4217 code.
    pub fn new(currency: &str) -> Result<Self, PricingError> {
        let currency = resolve_currency(currency)?;

        Ok(Self {
            currency: currency.iso_alpha_code.to_ascii_lowercase(),
            simulate_confirmation: true,
            simulated_payment_method: DEFAULT_SIMULATED_PAYMENT_METHOD.to_string(),
        })
    }

    #[must_use]
    pub fn with_simulated_confirmation(mut self, enabled: bool) -> Self {
        self.simulate_confirmation = enabled;
        self
    }

    #[must_use]
    pub fn with_simulated_payment_method(mut self, payment_method: impl Into<String>) -> Self {
        self.simulated_payment_method = payment_method.into();
        self
    }

    /// Lower-case ISO 4217 code.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    #[must_use]
    pub fn simulate_confirmation(&self) -> bool {
        self.simulate_confirmation
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: "usd".to_string(),
            simulate_confirmation: true,
            simulated_payment_method: DEFAULT_SIMULATED_PAYMENT_METHOD.to_string(),
        }
    }
}

/// Where an address comes from for one checkout role.
enum AddressSource<'a> {
    Saved(AddressUuid),
    Manual(&'a Address),
    MostRecent,
}

pub struct CheckoutService {
    carts: Arc<dyn CartsService>,
    addresses: Arc<dyn AddressesService>,
    orders: Arc<dyn OrdersService>,
    payments: Arc<dyn PaymentProcessor>,
    config: CheckoutConfig,
    locks: CheckoutLocks,
}

impl CheckoutService {
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartsService>,
        addresses: Arc<dyn AddressesService>,
        orders: Arc<dyn OrdersService>,
        payments: Arc<dyn PaymentProcessor>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            carts,
            addresses,
            orders,
            payments,
            config,
            locks: CheckoutLocks::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Resolve shipping and billing addresses and check the payment form.
    /// Has no side effects.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] listing every missing field, or
    /// [`CheckoutError::Addresses`] if saved addresses cannot be read.
    pub async fn validate(
        &self,
        user: UserUuid,
        request: &CheckoutRequest,
    ) -> Result<ValidatedCheckout, CheckoutError> {
        let mut missing = Vec::new();

        let shipping_source = match &request.shipping {
            ShippingSelection::Saved { address_uuid } => AddressSource::Saved(*address_uuid),
            ShippingSelection::Manual { address } => AddressSource::Manual(address),
            ShippingSelection::Default => AddressSource::MostRecent,
        };

        let shipping = self
            .resolve_address(user, shipping_source, "shipping", &mut missing)
            .await?;

        let billing = match &request.billing {
            BillingSelection::SameAsShipping => shipping.clone(),
            BillingSelection::Saved { address_uuid } => {
                self.resolve_address(user, AddressSource::Saved(*address_uuid), "billing", &mut missing)
                    .await?
            }
            BillingSelection::Manual { address } => {
                self.resolve_address(user, AddressSource::Manual(address), "billing", &mut missing)
                    .await?
            }
        };

        if let PaymentMethodChoice::Card(card) = &request.payment_method {
            missing.extend(
                card.missing_fields()
                    .into_iter()
                    .map(|field| format!("card.{field}")),
            );
        }

        match (shipping, billing) {
            (Some(shipping_address), Some(billing_address)) if missing.is_empty() => {
                Ok(ValidatedCheckout {
                    user,
                    shipping_address,
                    billing_address,
                })
            }
            _ => Err(CheckoutError::Validation { missing }),
        }
    }

    /// Create a payment intent for the current server cart total.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`], a cart or pricing error, or a
    /// provider or network error from the processor.
    pub async fn create_intent(
        &self,
        checkout: &ValidatedCheckout,
    ) -> Result<PendingPayment, CheckoutError> {
        let _guard = self.locks.acquire(checkout.user)?;

        self.open_intent(checkout).await
    }

    /// Confirm the payment, persist the order, clear the cart and return the
    /// receipt.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::ForeignPaymentIntent`],
    /// [`CheckoutError::AmountMismatch`] when the cart changed since the intent
    /// was created, [`CheckoutError::PaymentNotCompleted`], or
    /// [`CheckoutError::OrderPersistence`] once the payment is captured.
    pub async fn complete(
        &self,
        checkout: &ValidatedCheckout,
        payment_intent_id: &str,
    ) -> Result<Receipt, CheckoutError> {
        let _guard = self.locks.acquire(checkout.user)?;

        let intent = self.confirm_payment(checkout.user, payment_intent_id).await?;

        self.fulfil(checkout, &intent).await
    }

    /// Run every step in order. Cancellation is honoured until the payment is
    /// confirmed.
    #[tracing::instrument(name = "checkout.run", skip_all, fields(user_uuid = %user))]
    pub async fn run(
        &self,
        user: UserUuid,
        request: &CheckoutRequest,
        cancellation: &CheckoutCancellation,
    ) -> CheckoutResult {
        let mut state = CheckoutState::Idle;

        match self.run_steps(user, request, cancellation, &mut state).await {
            Ok(receipt) => CheckoutResult::Receipt(receipt),
            Err(error) => {
                warn!(last_state = %state, code = error.code(), %error, "checkout failed");

                CheckoutResult::Failed(CheckoutFailure {
                    last_state: state,
                    error,
                })
            }
        }
    }

    async fn run_steps(
        &self,
        user: UserUuid,
        request: &CheckoutRequest,
        cancellation: &CheckoutCancellation,
        state: &mut CheckoutState,
    ) -> Result<Receipt, CheckoutError> {
        let _guard = self.locks.acquire(user)?;

        cancellation.check()?;

        let checkout = self.validate(user, request).await?;
        *state = CheckoutState::AddressValidated;

        cancellation.check()?;

        let pending = tokio::select! {
            biased;
            () = cancellation.cancelled() => return Err(CheckoutError::Cancelled),
            pending = self.open_intent(&checkout) => pending?,
        };
        *state = CheckoutState::IntentCreated;

        cancellation.check()?;

        let intent = self
            .confirm_payment(user, &pending.payment_intent_id)
            .await?;
        *state = CheckoutState::PaymentConfirmed;

        self.fulfil_tracked(&checkout, &intent, state).await
    }

    async fn fulfil(
        &self,
        checkout: &ValidatedCheckout,
        intent: &PaymentIntent,
    ) -> Result<Receipt, CheckoutError> {
        let mut state = CheckoutState::PaymentConfirmed;

        self.fulfil_tracked(checkout, intent, &mut state).await
    }

    async fn fulfil_tracked(
        &self,
        checkout: &ValidatedCheckout,
        intent: &PaymentIntent,
        state: &mut CheckoutState,
    ) -> Result<Receipt, CheckoutError> {
        let order = self.persist_order(checkout, intent).await?;
        *state = CheckoutState::OrderPersisted;

        if let Err(error) = self.carts.clear_cart(checkout.user).await {
            error!(
                user_uuid = %checkout.user,
                order_uuid = %order.uuid,
                %error,
                "order placed but cart could not be cleared"
            );
        }
        *state = CheckoutState::CartCleared;

        let receipt = Receipt {
            order_uuid: order.uuid,
            payment_intent_id: intent.id.clone(),
            amount: intent.amount,
            currency: order.currency,
            payment_status: intent.status,
            shipping_address: checkout.shipping_address.clone(),
        };
        *state = CheckoutState::Done;

        info!(
            user_uuid = %checkout.user,
            order_uuid = %receipt.order_uuid,
            payment_intent_id = %receipt.payment_intent_id,
            amount = receipt.amount,
            "checkout completed"
        );

        Ok(receipt)
    }

    async fn resolve_address(
        &self,
        user: UserUuid,
        source: AddressSource<'_>,
        role: &str,
        missing: &mut Vec<String>,
    ) -> Result<Option<Address>, CheckoutError> {
        let address = match source {
            AddressSource::Manual(address) => address.clone(),
            AddressSource::Saved(address_uuid) => {
                match self.addresses.get_address(user, address_uuid).await {
                    Ok(record) => record.address,
                    Err(AddressesServiceError::NotFound) => {
                        missing.push(format!("{role}_address"));
                        return Ok(None);
                    }
                    Err(error) => return Err(CheckoutError::Addresses(error)),
                }
            }
            AddressSource::MostRecent => {
                let saved = self
                    .addresses
                    .list_addresses(user)
                    .await
                    .map_err(CheckoutError::Addresses)?;

                match saved.into_iter().next() {
                    Some(record) => record.address,
                    None => {
                        missing.push(format!("{role}_address"));
                        return Ok(None);
                    }
                }
            }
        };

        let blank = address.missing_fields();

        if blank.is_empty() {
            Ok(Some(address))
        } else {
            missing.extend(blank.into_iter().map(|field| format!("{role}.{field}")));
            Ok(None)
        }
    }

    #[tracing::instrument(name = "checkout.create_intent", skip_all, fields(user_uuid = %checkout.user), err)]
    async fn open_intent(
        &self,
        checkout: &ValidatedCheckout,
    ) -> Result<PendingPayment, CheckoutError> {
        let cart = self
            .carts
            .get_cart(checkout.user)
            .await
            .map_err(CheckoutError::Cart)?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let totals = cart.totals()?;
        let attempt = Uuid::now_v7();

        let metadata = BTreeMap::from([
            (USER_METADATA_KEY.to_string(), checkout.user.to_string()),
            (ITEM_COUNT_METADATA_KEY.to_string(), cart.item_count().to_string()),
        ]);

        let intent = self
            .payments
            .create_intent(NewPaymentIntent {
                amount: totals.total,
                currency: self.config.currency.clone(),
                metadata,
                idempotency_key: format!("checkout-{attempt}"),
            })
            .await?;

        info!(
            payment_intent_id = %intent.id,
            amount = intent.amount,
            "payment intent created"
        );

        Ok(PendingPayment::from(intent))
    }

    #[tracing::instrument(name = "checkout.confirm_payment", skip(self), err)]
    async fn confirm_payment(
        &self,
        user: UserUuid,
        payment_intent_id: &str,
    ) -> Result<PaymentIntent, CheckoutError> {
        let mut intent = self.payments.retrieve_intent(payment_intent_id).await?;

        if !intent.belongs_to(&user.to_string()) {
            return Err(CheckoutError::ForeignPaymentIntent);
        }

        self.check_amount(user, &intent).await?;

        if self.config.simulate_confirmation && intent.status.awaits_payment_method() {
            intent = self
                .payments
                .confirm_intent(&intent.id, &self.config.simulated_payment_method)
                .await?;
        }

        if intent.status != PaymentIntentStatus::Succeeded {
            return Err(CheckoutError::PaymentNotCompleted {
                status: intent.status,
            });
        }

        Ok(intent)
    }

    /// The intent must still cover exactly the current cart. A mismatch before
    /// capture stops the checkout; after capture it needs reconciliation.
    async fn check_amount(
        &self,
        user: UserUuid,
        intent: &PaymentIntent,
    ) -> Result<(), CheckoutError> {
        let captured = intent.status == PaymentIntentStatus::Succeeded;

        let cart_total = match self.cart_total(user).await {
            Ok(total) => total,
            Err(error) if captured => {
                return Err(order_persistence_failure(user, &intent.id, Box::new(error)));
            }
            Err(error) => return Err(error),
        };

        if cart_total == intent.amount {
            return Ok(());
        }

        let source = CartTotalChanged {
            intent_amount: intent.amount,
            cart_total,
        };

        if captured {
            return Err(order_persistence_failure(user, &intent.id, Box::new(source)));
        }

        warn!(
            payment_intent_id = %intent.id,
            intent_amount = intent.amount,
            cart_total,
            "cart changed since the payment intent was created"
        );

        Err(CheckoutError::AmountMismatch {
            payment_intent_id: intent.id.clone(),
            source,
        })
    }

    async fn cart_total(&self, user: UserUuid) -> Result<u64, CheckoutError> {
        let cart = self
            .carts
            .get_cart(user)
            .await
            .map_err(CheckoutError::Cart)?;

        Ok(cart.totals()?.total)
    }

    async fn persist_order(
        &self,
        checkout: &ValidatedCheckout,
        intent: &PaymentIntent,
    ) -> Result<NewOrder, CheckoutError> {
        let persistence_failure = |source: Box<dyn std::error::Error + Send + Sync>| {
            order_persistence_failure(checkout.user, &intent.id, source)
        };

        let cart = self
            .carts
            .get_cart(checkout.user)
            .await
            .map_err(|error| persistence_failure(Box::new(error)))?;

        let totals = cart
            .totals()
            .map_err(|error| persistence_failure(Box::new(error)))?;

        if totals.total != intent.amount {
            return Err(persistence_failure(Box::new(CartTotalChanged {
                intent_amount: intent.amount,
                cart_total: totals.total,
            })));
        }

        let order = NewOrder {
            uuid: OrderUuid::new(),
            user_uuid: checkout.user,
            total_amount: intent.amount,
            currency: self.config.currency.clone(),
            shipping_address: checkout.shipping_address.clone(),
            billing_address: checkout.billing_address.clone(),
            status: OrderStatus::Paid,
            payment_intent_id: intent.id.clone(),
            items: totals
                .lines
                .iter()
                .map(|line| NewOrderItem {
                    uuid: OrderItemUuid::new(),
                    product_uuid: line.product_uuid,
                    quantity: line.quantity,
                    price: line.unit_price,
                })
                .collect(),
        };

        match self.orders.create_order(order).await {
            Ok(created) => Ok(created.order),
            Err(OrdersServiceError::AlreadyExists) => {
                warn!(payment_intent_id = %intent.id, "payment intent already backs an order");

                Err(CheckoutError::AlreadyFulfilled {
                    payment_intent_id: intent.id.clone(),
                })
            }
            Err(error) => Err(persistence_failure(Box::new(error))),
        }
    }
}

/// Logged at error level: the payment stands without an order.
fn order_persistence_failure(
    user: UserUuid,
    payment_intent_id: &str,
    source: Box<dyn std::error::Error + Send + Sync>,
) -> CheckoutError {
    error!(
        user_uuid = %user,
        payment_intent_id,
        error = %source,
        "payment captured but order was not persisted; reconcile manually"
    );

    CheckoutError::OrderPersistence {
        payment_intent_id: payment_intent_id.to_string(),
        source,
    }
}

impl std::fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService")
            .field("config", &self.config)
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use jiff::Timestamp;
    use mockall::predicate::eq;
    use testresult::TestResult;

    use crate::{
        checkout::CardDetails,
        domain::{
            addresses::{MockAddressesService, records::AddressRecord},
            carts::{
                CartsServiceError, MockCartsService,
                records::{Cart, CartItemRecord, CartItemUuid, CartLine},
            },
            orders::{MockOrdersService, data::CreatedOrder},
            products::records::{ProductRecord, ProductUuid},
        },
        payments::{MockPaymentProcessor, PaymentProcessorError},
        test::helpers::address,
    };

    use super::*;

    fn card() -> PaymentMethodChoice {
        PaymentMethodChoice::Card(CardDetails {
            holder_name: "Ada Lovelace".to_string(),
            number: "4242424242424242".to_string(),
            expiry: "12/30".to_string(),
            cvc: "123".to_string(),
        })
    }

    fn manual_request() -> CheckoutRequest {
        CheckoutRequest {
            shipping: ShippingSelection::Manual { address: address() },
            billing: BillingSelection::SameAsShipping,
            payment_method: card(),
        }
    }

    fn cart_with(user: UserUuid, sell_price: u64, quantity: u32) -> (Cart, ProductUuid) {
        let product = ProductRecord {
            uuid: ProductUuid::new(),
            name: "Widget".to_string(),
            price: sell_price,
            sell_price,
            stock: 10,
            images: Vec::new(),
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
            deleted_at: None,
        };
        let product_uuid = product.uuid;

        let cart = Cart {
            user_uuid: user,
            lines: vec![CartLine {
                item: CartItemRecord {
                    uuid: CartItemUuid::new(),
                    user_uuid: user,
                    product_uuid,
                    quantity,
                    created_at: Timestamp::UNIX_EPOCH,
                    updated_at: Timestamp::UNIX_EPOCH,
                },
                product,
            }],
        };

        (cart, product_uuid)
    }

    fn intent(user: UserUuid, amount: u64, status: PaymentIntentStatus) -> PaymentIntent {
        PaymentIntent {
            id: "pi_123".to_string(),
            amount,
            currency: "usd".to_string(),
            status,
            client_secret: Some("pi_123_secret".to_string()),
            metadata: BTreeMap::from([(USER_METADATA_KEY.to_string(), user.to_string())]),
        }
    }

    struct Mocks {
        carts: MockCartsService,
        addresses: MockAddressesService,
        orders: MockOrdersService,
        payments: MockPaymentProcessor,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                carts: MockCartsService::new(),
                addresses: MockAddressesService::new(),
                orders: MockOrdersService::new(),
                payments: MockPaymentProcessor::new(),
            }
        }

        fn service(self) -> TestResult<CheckoutService> {
            Ok(CheckoutService::new(
                Arc::new(self.carts),
                Arc::new(self.addresses),
                Arc::new(self.orders),
                Arc::new(self.payments),
                CheckoutConfig::new("USD")?,
            ))
        }
    }

    /// Cart reads return `cart` until it is cleared.
    fn stateful_cart(mocks: &mut Mocks, cart: Cart) -> Arc<Mutex<Cart>> {
        let state = Arc::new(Mutex::new(cart));

        let read = Arc::clone(&state);
        mocks.carts.expect_get_cart().returning(move |_| {
            read.lock()
                .map(|cart| cart.clone())
                .map_err(|_| CartsServiceError::InvalidData)
        });

        let clear = Arc::clone(&state);
        mocks.carts.expect_clear_cart().returning(move |user| {
            let mut cart = clear.lock().map_err(|_| CartsServiceError::InvalidData)?;
            *cart = Cart::empty(user);
            Ok(cart.clone())
        });

        state
    }

    #[tokio::test]
    async fn missing_address_fails_validation_without_calling_processor() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();

        mocks
            .addresses
            .expect_list_addresses()
            .with(eq(user))
            .returning(|_| Ok(Vec::new()));
        mocks.payments.expect_create_intent().never();
        mocks.payments.expect_retrieve_intent().never();
        mocks.carts.expect_get_cart().never();

        let service = mocks.service()?;

        let request = CheckoutRequest {
            shipping: ShippingSelection::Default,
            billing: BillingSelection::SameAsShipping,
            payment_method: card(),
        };

        let result = service
            .run(user, &request, &CheckoutCancellation::never())
            .await;

        let CheckoutResult::Failed(failure) = result else {
            return Err("expected failure".into());
        };

        assert_eq!(failure.last_state, CheckoutState::Idle);
        assert!(matches!(
            failure.error,
            CheckoutError::Validation { ref missing } if missing == &vec!["shipping_address".to_string()]
        ));

        Ok(())
    }

    #[tokio::test]
    async fn validation_lists_every_missing_field() -> TestResult {
        let user = UserUuid::new();
        let service = Mocks::new().service()?;

        let request = CheckoutRequest {
            shipping: ShippingSelection::Manual {
                address: Address {
                    city: String::new(),
                    ..address()
                },
            },
            billing: BillingSelection::SameAsShipping,
            payment_method: PaymentMethodChoice::Card(CardDetails {
                holder_name: "Ada".to_string(),
                ..CardDetails::default()
            }),
        };

        let result = service.validate(user, &request).await;

        let Err(CheckoutError::Validation { missing }) = result else {
            return Err(format!("expected validation error, got {result:?}").into());
        };

        assert_eq!(
            missing,
            vec!["shipping.city", "card.number", "card.expiry", "card.cvc"]
        );

        Ok(())
    }

    #[tokio::test]
    async fn default_shipping_uses_most_recent_saved_address() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();

        let newest = Address {
            city: "Manchester".to_string(),
            ..address()
        };
        let records = vec![
            AddressRecord {
                uuid: AddressUuid::new(),
                user_uuid: user,
                address: newest.clone(),
                created_at: Timestamp::UNIX_EPOCH,
            },
            AddressRecord {
                uuid: AddressUuid::new(),
                user_uuid: user,
                address: address(),
                created_at: Timestamp::UNIX_EPOCH,
            },
        ];

        mocks
            .addresses
            .expect_list_addresses()
            .returning(move |_| Ok(records.clone()));

        let validated = mocks
            .service()?
            .validate(
                user,
                &CheckoutRequest {
                    shipping: ShippingSelection::Default,
                    billing: BillingSelection::SameAsShipping,
                    payment_method: PaymentMethodChoice::Wallet,
                },
            )
            .await?;

        assert_eq!(validated.shipping_address, newest);
        assert_eq!(validated.billing_address, newest);

        Ok(())
    }

    #[tokio::test]
    async fn another_users_saved_address_is_a_validation_error() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();

        mocks
            .addresses
            .expect_get_address()
            .returning(|_, _| Err(AddressesServiceError::NotFound));

        let result = mocks
            .service()?
            .validate(
                user,
                &CheckoutRequest {
                    shipping: ShippingSelection::Saved {
                        address_uuid: AddressUuid::new(),
                    },
                    billing: BillingSelection::SameAsShipping,
                    payment_method: PaymentMethodChoice::Wallet,
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(CheckoutError::Validation { ref missing }) if missing == &vec!["shipping_address".to_string()]
        ));

        Ok(())
    }

    #[tokio::test]
    async fn empty_cart_never_creates_an_intent() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();

        mocks
            .carts
            .expect_get_cart()
            .returning(|user| Ok(Cart::empty(user)));
        mocks.payments.expect_create_intent().never();

        let result = mocks
            .service()?
            .run(user, &manual_request(), &CheckoutCancellation::never())
            .await;

        let CheckoutResult::Failed(failure) = result else {
            return Err("expected failure".into());
        };

        assert_eq!(failure.last_state, CheckoutState::AddressValidated);
        assert!(matches!(failure.error, CheckoutError::EmptyCart));

        Ok(())
    }

    #[tokio::test]
    async fn happy_path_charges_cart_total_and_clears_cart() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();
        let (cart, product) = cart_with(user, 50_00, 1);
        let cart_state = stateful_cart(&mut mocks, cart);

        mocks
            .payments
            .expect_create_intent()
            .withf(move |new| {
                new.amount == 50_00
                    && new.currency == "usd"
                    && new.metadata.get(USER_METADATA_KEY) == Some(&user.to_string())
                    && new.metadata.get(ITEM_COUNT_METADATA_KEY).map(String::as_str) == Some("1")
                    && new.idempotency_key.starts_with("checkout-")
            })
            .times(1)
            .returning(move |_| Ok(intent(user, 50_00, PaymentIntentStatus::RequiresPaymentMethod)));
        mocks
            .payments
            .expect_retrieve_intent()
            .with(eq("pi_123"))
            .returning(move |_| Ok(intent(user, 50_00, PaymentIntentStatus::RequiresPaymentMethod)));
        mocks
            .payments
            .expect_confirm_intent()
            .with(eq("pi_123"), eq(DEFAULT_SIMULATED_PAYMENT_METHOD))
            .times(1)
            .returning(move |_, _| Ok(intent(user, 50_00, PaymentIntentStatus::Succeeded)));
        mocks
            .orders
            .expect_create_order()
            .withf(move |order| {
                order.total_amount == 50_00
                    && order.status == OrderStatus::Paid
                    && order.payment_intent_id == "pi_123"
                    && order.items.len() == 1
                    && order.items[0].product_uuid == product
                    && order.items[0].quantity == 1
                    && order.items[0].price == 50_00
            })
            .times(1)
            .returning(|order| {
                Ok(CreatedOrder {
                    uuid: order.uuid,
                    created_at: Timestamp::UNIX_EPOCH,
                    order,
                })
            });

        let result = mocks
            .service()?
            .run(user, &manual_request(), &CheckoutCancellation::never())
            .await;

        let CheckoutResult::Receipt(receipt) = result else {
            return Err(format!("expected receipt, got {result:?}").into());
        };

        assert_eq!(receipt.amount, 50_00);
        assert_eq!(receipt.currency, "usd");
        assert_eq!(receipt.payment_intent_id, "pi_123");
        assert_eq!(receipt.payment_status, PaymentIntentStatus::Succeeded);
        assert_eq!(receipt.shipping_address, address());
        assert!(cart_state.lock().map_err(|e| e.to_string())?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn unconfirmed_payment_is_not_completed() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();
        let (cart, _product) = cart_with(user, 10_00, 1);

        mocks.carts.expect_get_cart().returning(move |_| Ok(cart.clone()));

        mocks
            .payments
            .expect_retrieve_intent()
            .returning(move |_| Ok(intent(user, 10_00, PaymentIntentStatus::RequiresAction)));
        mocks.payments.expect_confirm_intent().never();
        mocks.orders.expect_create_order().never();

        let service = mocks.service()?;
        let checkout = service.validate(user, &manual_request()).await?;

        let result = service.complete(&checkout, "pi_123").await;

        assert!(matches!(
            result,
            Err(CheckoutError::PaymentNotCompleted {
                status: PaymentIntentStatus::RequiresAction
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn without_simulation_only_succeeded_passes() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();
        let (cart, _product) = cart_with(user, 10_00, 1);

        mocks.carts.expect_get_cart().returning(move |_| Ok(cart.clone()));

        mocks
            .payments
            .expect_retrieve_intent()
            .returning(move |_| Ok(intent(user, 10_00, PaymentIntentStatus::RequiresPaymentMethod)));
        mocks.payments.expect_confirm_intent().never();

        let service = CheckoutService::new(
            Arc::new(mocks.carts),
            Arc::new(mocks.addresses),
            Arc::new(mocks.orders),
            Arc::new(mocks.payments),
            CheckoutConfig::new("usd")?.with_simulated_confirmation(false),
        );
        let checkout = service.validate(user, &manual_request()).await?;

        let result = service.complete(&checkout, "pi_123").await;

        assert!(matches!(
            result,
            Err(CheckoutError::PaymentNotCompleted { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn cart_grown_since_intent_is_refused_before_confirmation() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();
        let (cart, _product) = cart_with(user, 100_000, 1);

        mocks.carts.expect_get_cart().returning(move |_| Ok(cart.clone()));
        mocks.carts.expect_clear_cart().never();
        mocks
            .payments
            .expect_retrieve_intent()
            .returning(move |_| Ok(intent(user, 1_00, PaymentIntentStatus::RequiresPaymentMethod)));
        mocks.payments.expect_confirm_intent().never();
        mocks.orders.expect_create_order().never();

        let service = mocks.service()?;
        let checkout = service.validate(user, &manual_request()).await?;

        let result = service.complete(&checkout, "pi_123").await;

        let Err(CheckoutError::AmountMismatch {
            payment_intent_id,
            source,
        }) = result
        else {
            return Err(format!("expected amount mismatch, got {result:?}").into());
        };

        assert_eq!(payment_intent_id, "pi_123");
        assert_eq!(
            source,
            CartTotalChanged {
                intent_amount: 1_00,
                cart_total: 100_000,
            }
        );

        Ok(())
    }

    #[tokio::test]
    async fn cart_grown_after_capture_is_never_recorded_as_paid() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();
        let (cart, _product) = cart_with(user, 100_000, 1);

        mocks.carts.expect_get_cart().returning(move |_| Ok(cart.clone()));
        mocks.carts.expect_clear_cart().never();
        mocks
            .payments
            .expect_retrieve_intent()
            .returning(move |_| Ok(intent(user, 1_00, PaymentIntentStatus::Succeeded)));
        mocks.orders.expect_create_order().never();

        let service = mocks.service()?;
        let checkout = service.validate(user, &manual_request()).await?;

        let result = service.complete(&checkout, "pi_123").await;

        assert!(matches!(
            result,
            Err(CheckoutError::OrderPersistence { ref payment_intent_id, .. }) if payment_intent_id == "pi_123"
        ));

        Ok(())
    }

    #[tokio::test]
    async fn cart_changed_between_capture_and_order_is_not_persisted() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();
        let (before, _product) = cart_with(user, 10_00, 1);
        let (after, _other) = cart_with(user, 10_00, 3);

        let mut reads = mockall::Sequence::new();
        mocks
            .carts
            .expect_get_cart()
            .times(1)
            .in_sequence(&mut reads)
            .returning(move |_| Ok(before.clone()));
        mocks
            .carts
            .expect_get_cart()
            .times(1)
            .in_sequence(&mut reads)
            .returning(move |_| Ok(after.clone()));
        mocks.carts.expect_clear_cart().never();
        mocks
            .payments
            .expect_retrieve_intent()
            .returning(move |_| Ok(intent(user, 10_00, PaymentIntentStatus::RequiresPaymentMethod)));
        mocks
            .payments
            .expect_confirm_intent()
            .times(1)
            .returning(move |_, _| Ok(intent(user, 10_00, PaymentIntentStatus::Succeeded)));
        mocks.orders.expect_create_order().never();

        let service = mocks.service()?;
        let checkout = service.validate(user, &manual_request()).await?;

        let result = service.complete(&checkout, "pi_123").await;

        assert!(matches!(result, Err(CheckoutError::OrderPersistence { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn another_users_intent_is_refused() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();

        mocks
            .payments
            .expect_retrieve_intent()
            .returning(|_| Ok(intent(UserUuid::new(), 10_00, PaymentIntentStatus::Succeeded)));
        mocks.orders.expect_create_order().never();

        let service = mocks.service()?;
        let checkout = service.validate(user, &manual_request()).await?;

        let result = service.complete(&checkout, "pi_123").await;

        assert!(matches!(result, Err(CheckoutError::ForeignPaymentIntent)));

        Ok(())
    }

    #[tokio::test]
    async fn persistence_failure_carries_payment_intent_and_keeps_cart() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();
        let (cart, _product) = cart_with(user, 10_00, 2);

        mocks.carts.expect_get_cart().returning(move |_| Ok(cart.clone()));
        mocks.carts.expect_clear_cart().never();
        mocks
            .payments
            .expect_retrieve_intent()
            .returning(move |_| Ok(intent(user, 20_00, PaymentIntentStatus::Succeeded)));
        mocks
            .orders
            .expect_create_order()
            .returning(|_| Err(OrdersServiceError::InvalidData));

        let service = mocks.service()?;
        let checkout = service.validate(user, &manual_request()).await?;

        let result = service.complete(&checkout, "pi_123").await;

        assert!(matches!(
            result,
            Err(CheckoutError::OrderPersistence { ref payment_intent_id, .. }) if payment_intent_id == "pi_123"
        ));

        Ok(())
    }

    #[tokio::test]
    async fn reused_intent_is_already_fulfilled() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();
        let (cart, _product) = cart_with(user, 10_00, 1);

        mocks.carts.expect_get_cart().returning(move |_| Ok(cart.clone()));
        mocks
            .payments
            .expect_retrieve_intent()
            .returning(move |_| Ok(intent(user, 10_00, PaymentIntentStatus::Succeeded)));
        mocks
            .orders
            .expect_create_order()
            .returning(|_| Err(OrdersServiceError::AlreadyExists));

        let service = mocks.service()?;
        let checkout = service.validate(user, &manual_request()).await?;

        let result = service.complete(&checkout, "pi_123").await;

        assert!(matches!(result, Err(CheckoutError::AlreadyFulfilled { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn failing_cart_clear_still_returns_receipt() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();
        let (cart, _product) = cart_with(user, 10_00, 1);

        mocks.carts.expect_get_cart().returning(move |_| Ok(cart.clone()));
        mocks
            .carts
            .expect_clear_cart()
            .times(1)
            .returning(|_| Err(CartsServiceError::InvalidData));
        mocks
            .payments
            .expect_retrieve_intent()
            .returning(move |_| Ok(intent(user, 10_00, PaymentIntentStatus::Succeeded)));
        mocks.orders.expect_create_order().returning(|order| {
            Ok(CreatedOrder {
                uuid: order.uuid,
                created_at: Timestamp::UNIX_EPOCH,
                order,
            })
        });

        let service = mocks.service()?;
        let checkout = service.validate(user, &manual_request()).await?;

        let receipt = service.complete(&checkout, "pi_123").await?;

        assert_eq!(receipt.amount, 10_00);

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_checkout_for_same_user_is_refused() -> TestResult {
        let user = UserUuid::new();
        let service = Mocks::new().service()?;
        let checkout = service.validate(user, &manual_request()).await?;

        let _held = service.locks.acquire(user)?;

        let result = service.complete(&checkout, "pi_123").await;

        assert!(matches!(result, Err(CheckoutError::CheckoutInProgress)));

        Ok(())
    }

    #[tokio::test]
    async fn cancelled_attempt_stops_before_payment() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();

        mocks.payments.expect_create_intent().never();

        let service = mocks.service()?;
        let (handle, cancellation) = CheckoutCancellation::channel();

        handle.cancel();

        let result = service.run(user, &manual_request(), &cancellation).await;

        assert!(matches!(
            result,
            CheckoutResult::Failed(CheckoutFailure {
                error: CheckoutError::Cancelled,
                last_state: CheckoutState::Idle,
            })
        ));
        assert!(!service.locks.is_active(user));

        Ok(())
    }

    #[tokio::test]
    async fn processor_rejection_is_a_provider_error() -> TestResult {
        let user = UserUuid::new();
        let mut mocks = Mocks::new();
        let (cart, _product) = cart_with(user, 10_00, 1);

        mocks.carts.expect_get_cart().returning(move |_| Ok(cart.clone()));
        mocks.payments.expect_create_intent().returning(|_| {
            Err(PaymentProcessorError::Rejected {
                status: 400,
                message: "amount too small".to_string(),
            })
        });

        let service = mocks.service()?;
        let checkout = service.validate(user, &manual_request()).await?;

        let result = service.create_intent(&checkout).await;

        assert!(matches!(result, Err(CheckoutError::PaymentProvider(_))));

        Ok(())
    }
}
