pub mod breaking_news;
pub mod health;
pub mod metabox;
pub mod metrics;
pub mod settings;
