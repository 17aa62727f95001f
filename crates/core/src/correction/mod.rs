//! Certificate tier corrections.

pub mod calculator;

#[cfg(test)]
mod calculator_props;

pub use calculator::{CorrectionCalculator, CorrectionOutcome, CorrectionPlan};
