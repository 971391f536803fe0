mod in_memory_key_value_store;
mod local_key_value_store;
mod store_factory;

pub use in_memory_key_value_store::InMemoryKeyValueStore;
pub use local_key_value_store::LocalKeyValueStore;
pub use store_factory::KeyValueStoreFactory;
