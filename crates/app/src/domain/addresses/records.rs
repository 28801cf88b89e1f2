//! Address Records

use jiff::Timestamp;

use crate::{
    domain::{addresses::data::Address, users::records::UserUuid},
    uuids::TypedUuid,
};

/// Saved Address UUID
pub type AddressUuid = TypedUuid<AddressRecord>;

/// Saved Address Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub uuid: AddressUuid,
    pub user_uuid: UserUuid,
    pub address: Address,
    pub created_at: Timestamp,
}
