pub mod client;
pub mod error;
pub mod types;

pub use client::VodClient;
pub use error::VodError;
