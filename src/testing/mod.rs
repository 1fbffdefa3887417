//! Testing utilities and fixtures
//!
//! Mock providers and services plus ready-made polygons and tiles, shared by
//! the unit tests and the integration tests under `tests/`.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
