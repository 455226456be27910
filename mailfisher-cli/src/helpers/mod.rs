pub mod fetch_pool;
pub mod keyring_service;
