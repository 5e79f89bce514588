//! Shared foundational types used across the jif clock planner.
//!
//! This crate provides the exact [`Rational`] number type every frequency,
//! divider and multiplier is expressed in, conversions between rationals,
//! floats and JSON values, and the [`Frequency`] type used by plan files.

#![warn(missing_docs)]

pub mod frequency;
pub mod rational;

pub use frequency::{Frequency, ParseFrequencyError};
pub use rational::{hz, ratio, rational_from_f64, rational_to_f64, rational_to_json, Rational};
