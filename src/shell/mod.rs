pub mod environment;
pub mod executor;
pub mod expander;
pub mod history;
pub mod parser;
pub mod readline;
pub mod signals;
pub mod state;

#[allow(clippy::module_inception)]
mod shell;

pub use shell::Shell;
