//! Adapters for the development toolkit service

pub mod client;

pub use client::ToolkitClient;
