pub mod config;
pub mod control;
pub mod feeds;
pub mod logger;
pub mod monitor;
