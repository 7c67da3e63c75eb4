pub mod catalogue;
pub mod config;
pub mod dates;
pub mod domain;
pub mod error;
pub mod export;
pub mod harvest;
pub mod literal;
pub mod metadata;
pub mod output;
pub mod pid;
