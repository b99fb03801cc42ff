pub mod config;
pub mod console;
pub mod embedded;
pub mod engine;
pub mod layout;
pub mod loader;
pub mod manifest;
pub mod package;
pub mod runtime;
pub mod script;
