pub mod auth;
pub mod breaking_news;
pub mod post;
pub mod user;
