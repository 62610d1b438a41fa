pub mod clean;
pub mod config;
pub mod error;
pub mod matcher;
pub mod models;
pub mod playback;
pub mod season;
pub mod storage;
