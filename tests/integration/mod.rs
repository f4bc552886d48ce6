//! Integration tests for regflow
//!
//! These tests verify that multiple components work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod http_fetcher;
pub mod navigation_flow;
