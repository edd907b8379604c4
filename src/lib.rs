pub mod cli;
pub mod error;
pub mod news;
pub mod storage;
pub mod controller;
pub mod config;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{Error, Result};
