pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod security;
pub mod services;
pub mod utils;

pub use error::Error;
