//! Test Helpers

use crate::domain::{
    addresses::data::Address,
    products::{data::NewProduct, records::ProductUuid},
    users::{data::NewUser, records::UserUuid},
};

pub(crate) fn new_user(email: &str) -> NewUser {
    NewUser {
        uuid: UserUuid::new(),
        email: email.to_string(),
        name: "Ada Lovelace".to_string(),
        is_admin: false,
    }
}

pub(crate) fn new_product(sell_price: u64) -> NewProduct {
    NewProduct {
        uuid: ProductUuid::new(),
        name: "Widget".to_string(),
        price: sell_price + 5_00,
        sell_price,
        stock: 100,
        images: vec!["widget.jpg".to_string()],
    }
}

pub(crate) fn address() -> Address {
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
