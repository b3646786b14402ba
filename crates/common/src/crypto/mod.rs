mod keys;
mod seed;

pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use seed::{derive_app_key, SeedError, APP_DERIVATION_PATH};
