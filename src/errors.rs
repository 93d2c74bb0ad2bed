// Error types and error handling module
// This file defines the error and diagnostic types shared by the
// catalog, metric registry and configuration layers
//
// Numan Thabit 2025 Nov

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("exposition output is not valid utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("unknown location: city {city:?} in region {region:?}")]
    UnknownLocation { region: String, city: String },
}

/// Non-fatal configuration problem; the affected setting keeps its default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    #[error("{var}={value:?} is not a positive integer; using default {default}")]
    InvalidNumber {
        var: &'static str,
        value: String,
        default: u64,
    },
    #[error("{var}={value:?} is not a socket address; using default {default}")]
    InvalidAddress {
        var: &'static str,
        value: String,
        default: String,
    },
}
