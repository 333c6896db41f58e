pub mod engine;
pub mod error;
pub mod rpc;
pub mod tools;

/// Headless app builders for tests.
pub mod test_utils;
