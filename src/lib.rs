//! FAIRDICE — Provably-Fair Dice Staking Engine
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod error;
pub mod types;
pub mod rng;
pub mod stats;
pub mod strategy;
pub mod engine;
pub mod platforms;
pub mod report;
pub mod storage;
