pub mod cli;
pub mod client;
pub mod config;
pub mod event;
pub mod logs;
pub mod receiver;
pub mod sink;
