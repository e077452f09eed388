use lazy_static::lazy_static;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec};

lazy_static! {
    pub static ref SAVES_COUNTER: CounterVec = register_counter_vec!(
        "breaking_news_saves_total",
        "Metabox saves by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref EXPIRED_COUNTER: Counter = register_counter!(
        "breaking_news_expired_total",
        "Breaking-news records cleared after their expiry"
    ).unwrap();

    pub static ref RENDERS_COUNTER: CounterVec = register_counter_vec!(
        "breaking_news_renders_total",
        "Banners rendered by context",
        &["context"]
    ).unwrap();
}
