//! # pdfcalc Core Library
//!
//! A library for computing the atomic Pair Distribution Function (PDF) of crystalline
//! and molecular structures from interatomic distances, thermal displacements and
//! scattering powers.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture that keeps data, computation and
//! entry points apart.
//!
//! - **[`core`]: The Foundation.** Structure models and adapters, the lattice-sphere
//!   search and bond generator, and the strategy families (peak widths, peak profiles,
//!   baselines, envelopes, scattering factor tables) with their string-tag registries.
//!
//! - **[`engine`]: The Logic Core.** The stateful `PdfCalculator`, r-grid bookkeeping,
//!   the pair-summation driver with its accumulators, configuration and progress
//!   reporting.
//!
//! - **[`workflows`]: The Public API.** One-call procedures that configure a calculator
//!   from a `PdfConfig`, evaluate a structure and return the resulting arrays.

pub mod core;
pub mod engine;
pub mod workflows;
