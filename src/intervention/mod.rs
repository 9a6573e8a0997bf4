//! Intervention Module: Regime Switch with Structured Control
//!
//! Compares a path that switches from a crisis regime to a recovery regime
//! (plus a periodic control input) against a baseline that stays in
//! crisis, both driven by the same noise realisation.

mod controller;

pub use controller::{
    ControlSignal, InterventionController, InterventionOutcome, InterventionSummary, Regime,
};
