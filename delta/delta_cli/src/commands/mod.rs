//! Commands implemented by the Delta CLI
//!
//! - `config`: locating, creating and parsing the configuration file
//! - `console`: the line-oriented console that drives a running executor

pub mod config;
pub mod console;
