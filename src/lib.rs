pub mod config;
pub mod department;
pub mod extract;
pub mod input;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod processors;
pub mod sheets;
pub mod summary;
