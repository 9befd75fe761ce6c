//! Derived metrics over parsed energy readings.
//!
//! This module folds readings into totals and environmental impact,
//! selects trailing calendar windows and monthly buckets for the charts,
//! and classifies the panel fleet status.

pub mod aggregate;
pub mod status;
pub mod types;
pub mod utility;
pub mod window;
