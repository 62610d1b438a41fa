pub mod douban;
pub mod retry;
pub mod tmdb;
pub mod traits;
pub mod vod;
