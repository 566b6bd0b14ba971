//! Platform adapters

pub mod console;
