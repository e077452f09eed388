pub mod activation;
pub mod display_options;
pub mod expiry;
pub mod metrics;
pub mod nonce;
pub mod render;
pub mod validation;
