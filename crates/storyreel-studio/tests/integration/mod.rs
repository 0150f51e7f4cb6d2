//! End-to-end studio sessions over HTTP.

pub mod common;
pub mod session_tests;
