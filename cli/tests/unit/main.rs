//! Unit tests for the edge CLI
//!
//! These tests use in-memory fakes for every port and run without external I/O.

mod architecture;
mod property_tests;
mod reconcile;
mod services;
mod state_store;
