//! Test helpers.

use std::{collections::BTreeMap, sync::Arc};

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use storefront_app::{
    auth::{MockAuthService, Session, TokenUuid},
    checkout::CheckoutConfig,
    context::{AppContext, AppServices},
    domain::{
        addresses::{MockAddressesService, data::Address},
        carts::{
            MockCartsService,
            records::{Cart, CartItemRecord, CartItemUuid, CartLine},
        },
        orders::{
            MockOrdersService,
            records::{OrderItemRecord, OrderItemUuid, OrderRecord, OrderStatus, OrderUuid},
        },
        products::{
            MockProductsService,
            records::{ProductRecord, ProductUuid},
        },
        users::{
            MockUsersService,
            records::{UserRecord, UserUuid},
        },
    },
    payments::{MockPaymentProcessor, PaymentIntent, PaymentIntentStatus, USER_METADATA_KEY},
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_USER_UUID: UserUuid = UserUuid::from_uuid(Uuid::nil());
pub(crate) const TEST_TOKEN_UUID: TokenUuid = TokenUuid::from_uuid(Uuid::nil());

/// Service mocks for one test. Mocks without expectations panic when called.
#[derive(Default)]
pub(crate) struct TestServices {
    pub(crate) users: MockUsersService,
    pub(crate) auth: MockAuthService,
    pub(crate) products: MockProductsService,
    pub(crate) addresses: MockAddressesService,
    pub(crate) carts: MockCartsService,
    pub(crate) orders: MockOrdersService,
    pub(crate) payments: MockPaymentProcessor,
    pub(crate) checkout: CheckoutConfig,
}

impl TestServices {
    pub(crate) fn into_state(self) -> Arc<State> {
        let app = AppContext::from_services(
            AppServices {
                users: Arc::new(self.users),
                auth: Arc::new(self.auth),
                products: Arc::new(self.products),
                addresses: Arc::new(self.addresses),
                carts: Arc::new(self.carts),
                orders: Arc::new(self.orders),
                payments: Arc::new(self.payments),
            },
            self.checkout,
        );

        State::from_app_context(app)
    }

    /// Serve `route` as the regular test user.
    pub(crate) fn service(self, route: Router) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(self.into_state()))
                .hoop(inject_session)
                .push(route),
        )
    }

    /// Serve `route` as an administrator.
    pub(crate) fn admin_service(self, route: Router) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(self.into_state()))
                .hoop(inject_admin_session)
                .push(route),
        )
    }
}

impl std::fmt::Debug for TestServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestServices").finish_non_exhaustive()
    }
}

#[salvo::handler]
pub(crate) async fn inject_session(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_session(test_session());
    ctrl.call_next(req, depot, res).await;
}

#[salvo::handler]
pub(crate) async fn inject_admin_session(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_session(test_admin_session());
    ctrl.call_next(req, depot, res).await;
}

pub(crate) fn test_user() -> UserRecord {
    UserRecord {
        uuid: TEST_USER_UUID,
        email: "shopper@example.com".to_string(),
        name: "Test Shopper".to_string(),
        is_admin: false,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
        deleted_at: None,
    }
}

pub(crate) fn test_session() -> Session {
    Session {
        token_uuid: TEST_TOKEN_UUID,
        user: test_user(),
        cart_merged: false,
    }
}

pub(crate) fn test_admin_session() -> Session {
    Session {
        user: UserRecord {
            is_admin: true,
            ..test_user()
        },
        ..test_session()
    }
}

pub(crate) fn make_product(uuid: ProductUuid, sell_price: u64) -> ProductRecord {
    ProductRecord {
        uuid,
        name: "Desk Lamp".to_string(),
        price: sell_price + 5_00,
        sell_price,
        stock: 10,
        images: vec!["lamp.jpg".to_string()],
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
        deleted_at: None,
    }
}

/// The test user's cart holding `lines`.
pub(crate) fn make_cart(lines: &[(ProductRecord, u32)]) -> Cart {
    Cart {
        user_uuid: TEST_USER_UUID,
        lines: lines
            .iter()
            .map(|(product, quantity)| CartLine {
                item: CartItemRecord {
                    uuid: CartItemUuid::new(),
                    user_uuid: TEST_USER_UUID,
                    product_uuid: product.uuid,
                    quantity: *quantity,
                    created_at: Timestamp::UNIX_EPOCH,
                    updated_at: Timestamp::UNIX_EPOCH,
                },
                product: product.clone(),
            })
            .collect(),
    }
}

pub(crate) fn make_address() -> Address {
    Address {
        full_name: "Ada Lovelace".to_string(),
        line1: "12 St James's Square".to_string(),
        line2: None,
        city: "London".to_string(),
        region: None,
        postal_code: "SW1Y 4JH".to_string(),
        country: "GB".to_string(),
        phone: None,
    }
}

pub(crate) fn make_order(uuid: OrderUuid, product: &ProductRecord, quantity: u32) -> OrderRecord {
    OrderRecord {
        uuid,
        user_uuid: TEST_USER_UUID,
        total_amount: product.sell_price * u64::from(quantity),
        currency: "usd".to_string(),
        shipping_address: make_address(),
        billing_address: make_address(),
        status: OrderStatus::Paid,
        payment_intent_id: "pi_test".to_string(),
        items: vec![OrderItemRecord {
            uuid: OrderItemUuid::new(),
            order_uuid: uuid,
            product_uuid: product.uuid,
            quantity,
            price: product.sell_price,
            product_name: product.name.clone(),
            product_images: product.images.clone(),
        }],
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

/// A payment intent created for the test user.
pub(crate) fn make_intent(amount: u64, status: PaymentIntentStatus) -> PaymentIntent {
    PaymentIntent {
        id: "pi_test".to_string(),
        amount,
        currency: "usd".to_string(),
        status,
        client_secret: Some("pi_test_secret".to_string()),
        metadata: BTreeMap::from([(USER_METADATA_KEY.to_string(), TEST_USER_UUID.to_string())]),
    }
}
