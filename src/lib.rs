// Library root module for weather-exporter
// This file defines the public API and module structure of the synthetic
// weather metrics generator
//
// Numan Thabit 2025 Nov

pub mod catalog;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod sampler;
pub mod server;
