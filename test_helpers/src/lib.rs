//! Test helpers shared across the `contract-runner` workspace.
//!
//! - [`env`] serialises environment mutation behind RAII guards.
//! - [`mock_server`] runs a scripted contract server on a loopback port.

pub mod env;
pub mod mock_server;
