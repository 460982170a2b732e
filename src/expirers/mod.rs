//! Background sweeps: a hold expirer and a reservation sweeper, each a
//! `*Config` plus a `run(&self) -> !` loop that sleeps between scans and
//! never stops on a single scan's error.

pub mod hold_expirer;
pub mod reservation_sweeper;

pub use hold_expirer::{HoldExpirer, HoldExpirerConfig};
pub use reservation_sweeper::{ReservationSweeper, ReservationSweeperConfig};
