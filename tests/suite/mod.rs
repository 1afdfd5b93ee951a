//! Integration test modules

mod cli;
mod config;
