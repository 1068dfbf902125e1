//! Unit tests for variable resolution.

mod service_tests;
