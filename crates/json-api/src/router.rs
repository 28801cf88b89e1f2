//! App Router

use salvo::Router;

use crate::{addresses, auth, carts, checkout, healthcheck, observability, orders, products};

/// Public catalog and guest cart routes, plus everything behind bearer auth.
pub(crate) fn app_router() -> Router {
    Router::new()
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(observability::metrics_handler))
        .push(
            Router::with_path("products")
                .get(products::index::handler)
                .push(Router::with_path("{product}").get(products::get::handler)),
        )
        .push(Router::with_path("cart/guest/totals").post(carts::guest_totals::handler))
        .push(Router::with_path("cart/guest/items").post(carts::guest_add::handler))
        .push(
            Router::new()
                .hoop(auth::middleware::handler)
                .push(
                    Router::with_path("cart")
                        .get(carts::get::handler)
                        .delete(carts::clear::handler)
                        .push(Router::with_path("merge").post(carts::merge::handler))
                        .push(
                            Router::with_path("items")
                                .post(carts::items::create::handler)
                                .push(
                                    Router::with_path("{product}")
                                        .put(carts::items::update::handler)
                                        .delete(carts::items::delete::handler),
                                ),
                        ),
                )
                .push(
                    Router::with_path("addresses")
                        .get(addresses::index::handler)
                        .post(addresses::create::handler)
                        .push(Router::with_path("{address}").get(addresses::get::handler)),
                )
                .push(
                    Router::with_path("checkout")
                        .post(checkout::run::handler)
                        .push(Router::with_path("validate").post(checkout::validate::handler))
                        .push(
                            Router::with_path("payment-intents")
                                .post(checkout::intents::handler)
                                .push(
                                    Router::with_path("{intent}/confirm")
                                        .post(checkout::confirm::handler),
                                ),
                        ),
                )
                .push(
                    Router::with_path("orders")
                        .get(orders::index::handler)
                        .push(
                            Router::with_path("{order}")
                                .get(orders::get::handler)
                                .push(
                                    Router::with_path("status").put(orders::update_status::handler),
                                ),
                        ),
                ),
        )
}
