//! Fixtures shared by the tests of the workspace crates.

pub mod fixtures;
