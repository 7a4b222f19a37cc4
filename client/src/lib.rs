pub mod client;
pub mod config;
pub mod iface;
pub mod report;
