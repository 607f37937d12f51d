pub mod config;
pub mod logging;
pub mod tools;
pub mod web;
