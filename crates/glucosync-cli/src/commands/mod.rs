pub mod auth;
pub mod checkpoint;
pub mod config;
pub mod sync;
