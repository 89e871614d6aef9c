//! Utility functions module

pub mod units;
