pub mod aggregate;
pub mod competition;
pub mod config;
pub mod history;
pub mod logging;
pub mod output;
pub mod page_dump;
pub mod periods;
pub mod pipeline;
pub mod recency;
pub mod retry;
pub mod series;
pub mod sink;
pub mod source;
pub mod workers;
