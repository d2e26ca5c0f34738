//! Integration tests for charty-provision
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! Provider and SSH clients are replaced by stub scripts on `PATH`.
