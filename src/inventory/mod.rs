//! Inventory / hold manager - the critical concurrency subsystem.
//!
//! Numbered seats and general-admission capacity share one state-machine
//! vocabulary (`active → consumed | expired | released`) and a single
//! persist-before-call CAS pattern: every transition is a conditional
//! `UPDATE ... WHERE state = $expected`, checked by row count, never a
//! read-then-write race.

pub mod manager;
pub mod models;

pub use manager::HoldManager;
pub use models::{Hold, HoldKind, HoldState};
