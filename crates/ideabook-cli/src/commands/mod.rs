pub mod add;
pub mod auth_cmd;
pub mod common;
pub mod completions;
pub mod config;
pub mod connect;
pub mod delete;
pub mod edit;
pub mod export;
pub mod list;
pub mod status;
pub mod sync;
