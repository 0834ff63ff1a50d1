//! # Workflows Module
//!
//! High-level entry points that run a complete PDF calculation in one call.
//!
//! ## Overview
//!
//! A workflow takes a structure adapter and a [`PdfConfig`](crate::engine::config::PdfConfig),
//! builds a calculator from the configuration, evaluates it with progress reporting and
//! returns the trimmed and extended arrays as a single result value.
//!
//! ## Architecture
//!
//! - **PDF Workflow** ([`pdf`]) - Configuration, pair summation and signal processing
//!   phases of a PDF evaluation, returning a [`pdf::PdfResult`].

pub mod pdf;
