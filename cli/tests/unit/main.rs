//! Unit tests for charty-provision
//!
//! These tests use in-memory port fakes and run fast without external I/O.

mod instance;
mod key_pair;
mod mocks;
mod remote;
