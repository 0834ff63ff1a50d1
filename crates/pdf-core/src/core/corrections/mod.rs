//! # Corrections Module
//!
//! Real-space corrections applied to the band-limited PDF.
//!
//! - [`baseline`] - Additive baselines (the `-4πρr` term of a bulk PDF).
//! - [`envelope`] - Multiplicative envelopes: overall scale, instrumental
//!   resolution damping, finite particle size and a hard cutoff.

pub mod baseline;
pub mod envelope;
