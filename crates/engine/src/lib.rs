//! Contest reminder engine.
//!
//! This crate arms one timer per upcoming reminder and hands the contest to a
//! `ReminderSink` when the timer fires.

pub mod scheduler;

pub use scheduler::*;
