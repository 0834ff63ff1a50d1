//! # Core Module
//!
//! Stateless building blocks of the PDF calculation: structure models, pair
//! enumeration, peak shapes and the strategy registries.
//!
//! ## Overview
//!
//! Everything in this layer is either an immutable data record or a small
//! strategy object with named parameters. The stateful pieces (accumulators,
//! caches, the calculator itself) live in [`crate::engine`].
//!
//! ## Architecture
//!
//! - **Structure Models** ([`models`]) - Lattice, validated sites and source records
//! - **Structure Adapters** ([`structure`]) - The query interface and its periodic,
//!   crystal and molecule variants
//! - **Pair Enumeration** ([`bonds`]) - Lattice sphere, bond generator and summation
//!   conventions
//! - **Peak Shapes** ([`peaks`]) - Width models and lineshape profiles
//! - **Corrections** ([`corrections`]) - Baselines and envelopes
//! - **Scattering Powers** ([`scattering`]) - X-ray and neutron tables
//! - **Strategy Plumbing** ([`registry`], [`attributes`]) - Tag registries and
//!   named double parameters shared by every strategy family
//! - **Numerics** ([`utils`]) - Band-pass filtering and special functions

pub mod attributes;
pub mod bonds;
pub mod corrections;
pub mod models;
pub mod peaks;
pub mod registry;
pub mod scattering;
pub mod structure;
pub mod utils;
