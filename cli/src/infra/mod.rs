//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! EC2 API client, SSH sessions, key files, and config loading.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::output` are forbidden.

pub mod aws;
pub mod command_runner;
pub mod config;
pub mod fs;
pub mod ssh;
