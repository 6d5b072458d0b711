pub mod config;
pub mod error;
pub mod log;
pub mod path;
pub mod theme;
