mod confirmation;
mod conversion_api;
mod key_value_store;

pub use confirmation::Confirmation;
pub use conversion_api::{ConversionApi, ConversionApiError};
pub use key_value_store::{KeyValueStore, KeyValueStoreError};
