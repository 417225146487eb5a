//! Shared test infrastructure
#![allow(dead_code)]

pub mod database_helper;
pub mod stats_mock;
pub mod test_data;

pub use database_helper::TestDatabase;
pub use stats_mock::StatsMockServer;
pub use test_data::*;
