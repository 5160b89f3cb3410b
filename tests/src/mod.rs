//! Crate root of the cross-engine integration test suite: a thin lib
//! exposing shared harness code, with the scenarios themselves living
//! under `tests/`.

pub mod support;
