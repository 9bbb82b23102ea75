//! Multi-component scenario tests for the knowledge crate.

mod index_scenarios;
mod support;
