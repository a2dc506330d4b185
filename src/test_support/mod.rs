//! Helpers shared by in-crate tests.

pub mod socket_guard;
