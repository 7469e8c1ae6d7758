pub mod config;
pub mod converter;
pub mod metadata;
pub mod utility;
