pub mod client;
pub mod error;
pub mod types;

pub use client::DoubanClient;
pub use error::DoubanError;
