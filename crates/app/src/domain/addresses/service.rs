//! Addresses service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        addresses::{
            data::NewAddress,
            errors::AddressesServiceError,
            records::{AddressRecord, AddressUuid},
            repository::PgAddressesRepository,
        },
        users::records::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgAddressesService {
    db: Db,
    repository: PgAddressesRepository,
}

impl PgAddressesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgAddressesRepository::new(),
        }
    }
}

#[async_trait]
impl AddressesService for PgAddressesService {
    async fn list_addresses(
        &self,
        user: UserUuid,
    ) -> Result<Vec<AddressRecord>, AddressesServiceError> {
        let mut tx = self.db.begin().await?;

        let addresses = self.repository.list_addresses(&mut tx, user).await?;

        tx.commit().await?;

        Ok(addresses)
    }

    async fn get_address(
        &self,
        user: UserUuid,
        address: AddressUuid,
    ) -> Result<AddressRecord, AddressesServiceError> {
        let mut tx = self.db.begin().await?;

        let address = self.repository.get_address(&mut tx, user, address).await?;

        tx.commit().await?;

        Ok(address)
    }

    async fn create_address(
        &self,
        address: NewAddress,
    ) -> Result<AddressRecord, AddressesServiceError> {
        let missing = address.address.missing_fields();

        if !missing.is_empty() {
            return Err(AddressesServiceError::MissingRequiredData(missing));
        }

        let mut tx = self.db.begin().await?;

        let created = self.repository.create_address(&mut tx, address).await?;

        tx.commit().await?;

        Ok(created)
    }
}

/// A user's saved addresses.
#[automock]
#[async_trait]
pub trait AddressesService: Send + Sync {
    /// Saved addresses for a user, most recently added first.
    async fn list_addresses(
        &self,
        user: UserUuid,
    ) -> Result<Vec<AddressRecord>, AddressesServiceError>;

    /// A single saved address; another user's address is not found.
    async fn get_address(
        &self,
        user: UserUuid,
        address: AddressUuid,
    ) -> Result<AddressRecord, AddressesServiceError>;

    async fn create_address(
        &self,
        address: NewAddress,
    ) -> Result<AddressRecord, AddressesServiceError>;
}
