//! Shared test helpers for `tandem-core` integration tests.
//!
//! In-memory mocks for every port so the sync engine tests can assert on
//! call ordering and store contents without a database or network.

pub mod calendar;
pub mod repositories;
