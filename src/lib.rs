pub mod cli;
pub mod config;
pub mod current;
pub mod distance;
pub mod engine;
pub mod filter;
pub mod format;
pub mod logging;
pub mod model;
pub mod source;
pub mod tracker;
