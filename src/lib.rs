pub mod error;
pub mod validation;
pub mod model;
pub mod lookup;
pub mod diff;
pub mod source;
pub mod db;
pub mod render;
pub mod webhook;
pub mod config;
pub mod scan;
pub mod logging;
pub mod cli;
