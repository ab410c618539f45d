//! The Q&A community HTTP service: configuration, storage adapters and the web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
