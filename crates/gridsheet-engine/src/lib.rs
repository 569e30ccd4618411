//! gridsheet-engine - formula parsing, range functions and cell validation.

pub mod engine;
