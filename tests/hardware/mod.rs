//! Tests requiring real serial devices.
//!
//! Ignored by default. Point `TEST_PORT` at a device and run with the
//! `--ignored` flag.

pub mod real_port_tests;
pub mod utils;
