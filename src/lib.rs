//! Dynamic API-key issuance for the Packet (Equinix Metal) account API.
//!
//! Operators store an account token and define roles; callers ask for
//! credentials under a role and get a freshly minted, lease-bound API key that
//! is deleted again on revoke.

// HTTP surface
pub mod api;

// Root token check
pub mod auth;

// Engine operations: config, creds, renew, revoke
pub mod backend;

// Server settings and runtime lease config
pub mod config;

pub mod error;

// Leased secret model and host lease policy
pub mod lease;

// Remote account API client and shared client cache
pub mod remote;

// Role model, validation and persistence
pub mod role;

// Keyed storage backends
pub mod storage;
