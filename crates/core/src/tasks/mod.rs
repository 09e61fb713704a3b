//! Task store boundary.

pub mod ports;
