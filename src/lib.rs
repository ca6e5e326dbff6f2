//! pushbox library exports for the binary and integration tests

pub mod core;
pub mod messaging;
pub mod tui;
pub mod updates;

#[cfg(test)]
pub mod test_support;
