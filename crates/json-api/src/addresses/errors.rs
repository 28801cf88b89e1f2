//! Address Errors

use salvo::http::StatusError;
use tracing::error;

use storefront_app::domain::addresses::AddressesServiceError;

pub(crate) fn into_status_error(error: AddressesServiceError) -> StatusError {
    match error {
        AddressesServiceError::MissingRequiredData(fields) => StatusError::unprocessable_entity()
            .brief(format!("Missing required address fields: {}", fields.join(", "))),
        AddressesServiceError::AlreadyExists => {
            StatusError::conflict().brief("Address already exists")
        }
        AddressesServiceError::NotFound => StatusError::not_found().brief("Address not found"),
        AddressesServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid address data")
        }
        AddressesServiceError::Sql(source) => {
            error!("address storage failed: {source}");

            StatusError::internal_server_error()
        }
    }
}
