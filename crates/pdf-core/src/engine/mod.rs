//! # Engine Module
//!
//! This module turns a structure into PDF, RDF and RDF/r arrays on a uniform r-grid.
//!
//! ## Overview
//!
//! The engine owns the stateful part of a calculation: the calculator configuration,
//! the r-grid bookkeeping for ripple and peak-tail margins, per-structure scattering
//! data, and the pair-summation driver that feeds bonds into accumulators.
//!
//! ## Architecture
//!
//! - **Calculator** ([`calculator`]) - Composition root holding the strategies and producing
//!   trimmed and extended results
//! - **Configuration** ([`config`]) - `PdfConfig` loaded from TOML or built in code, with
//!   validation shared by the calculator setters
//! - **Grids** ([`grid`]) - Requested, ripple-extended and calculation grids
//! - **Pair Quantities** ([`quantity`], [`histogram`]) - Accumulators driven over all
//!   bonds, with anchor partitions summed in parallel under the `parallel` feature
//! - **Structure Cache** ([`cache`]) - Scattering powers and occupancy sums gathered once
//!   per evaluation
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Errors surfaced by an evaluation

pub mod cache;
pub mod calculator;
pub mod config;
pub mod error;
pub mod grid;
pub mod histogram;
pub mod progress;
pub mod quantity;
