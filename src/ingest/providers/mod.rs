pub mod news_api;
pub mod reddit;
pub mod rss;
pub mod static_source;

pub use news_api::NewsApiSource;
pub use reddit::RedditSource;
pub use rss::RssSource;
pub use static_source::StaticSource;
