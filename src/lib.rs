//! Turnstile - Tiered Request-Admission Gateway
//!
//! This crate implements a context-aware admission guard in front of a set of
//! named operations exposed through a single multiplexed gRPC entry point.
//! Every inbound call is checked against an ordered list of rate limit tiers,
//! subject to per-operation and per-group override rules, before its handler
//! is allowed to run.

pub mod admission;
pub mod config;
pub mod error;
pub mod grpc;
pub mod ops;
