// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod ai;
pub mod cache;
pub mod config;
pub mod daily;
pub mod odds;
pub mod props;
