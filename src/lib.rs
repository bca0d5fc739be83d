// Main library entry point for Logprobe.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;
