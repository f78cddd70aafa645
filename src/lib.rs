pub mod config;
pub mod dbinterface;
pub mod dbtype;
pub mod error;
pub mod events;
pub mod security;
