//! # Peaks Module
//!
//! Conversion of a bond into a broadened peak on the r-grid.
//!
//! ## Overview
//!
//! - [`width`] - Peak width models mapping a bond's mean-square displacement to a
//!   full width at half maximum.
//! - [`profile`] - Unit-area peak lineshapes and their effective support.
//!
//! Both families are selected by type tag from process-wide registries and
//! expose their tunable numbers through [`Attributes`](crate::core::attributes::Attributes).

pub mod profile;
pub mod width;
