pub mod builtins;
pub mod exec;
#[allow(clippy::module_inception)]
mod executor;
mod pipeline;
pub mod redirect;

pub use builtins::Builtin;
pub use executor::Executor;
