// Metric catalog types
pub mod catalog;

// Derived value functions
pub mod derived;

// Domain-specific error types
pub mod errors;

// Port interfaces
pub mod ports;

// Published samples
pub mod sample;

// Raw runtime readings
pub mod stats;
