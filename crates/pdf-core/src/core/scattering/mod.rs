//! # Scattering Module
//!
//! Scattering power of each atomic species for a given radiation.
//!
//! ## Overview
//!
//! A [`ScatteringFactorTable`] maps a species label such as `"Na1+"` or `"O2-"`
//! to a Q-independent scattering power: the electron count for x-rays and the
//! coherent scattering length for neutrons. Any label can be overridden with a
//! custom value. Tables are created by type tag from a process-wide registry.

pub mod tables;

use crate::core::registry::{RegistryError, TypeRegistry};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;
use tables::{ATOMIC_NUMBERS, NEUTRON_SCATTERING_LENGTHS};
use thiserror::Error;

/// Errors raised while resolving scattering factors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScatteringError {
    #[error("Unknown atom species '{species}' for {table} scattering table")]
    UnknownSpecies { table: &'static str, species: String },
}

/// Splits a species label into a normalized element symbol and ionic charge.
///
/// Accepted forms: `Fe`, `FE`, `Fe3+`, `Fe+3`, `O2-`, `Cl-`.
pub fn parse_species(label: &str) -> (String, f64) {
    let label = label.trim();
    let symbol_end = label
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(label.len());
    let (letters, rest) = label.split_at(symbol_end);

    let mut symbol = String::with_capacity(letters.len());
    let mut chars = letters.chars();
    if let Some(first) = chars.next() {
        symbol.push(first.to_ascii_uppercase());
        symbol.extend(chars.map(|c| c.to_ascii_lowercase()));
    }

    let sign = if rest.contains('-') {
        -1.0
    } else if rest.contains('+') {
        1.0
    } else {
        return (symbol, 0.0);
    };
    let digits: String = rest.chars().filter(char::is_ascii_digit).collect();
    let magnitude = if digits.is_empty() {
        1.0
    } else {
        digits.parse::<f64>().unwrap_or(1.0)
    };
    (symbol, sign * magnitude)
}

/// Species label → scattering power, with per-label custom overrides.
pub trait ScatteringFactorTable: Send + Sync + fmt::Debug {
    fn type_tag(&self) -> &'static str;

    /// Single-letter radiation code, `"X"` or `"N"`.
    fn radiation_type(&self) -> &'static str;

    fn standard_lookup(&self, species: &str) -> Result<f64, ScatteringError>;

    fn custom_values(&self) -> &BTreeMap<String, f64>;

    fn custom_values_mut(&mut self) -> &mut BTreeMap<String, f64>;

    fn create(&self) -> Box<dyn ScatteringFactorTable>;

    fn clone_box(&self) -> Box<dyn ScatteringFactorTable>;

    fn lookup(&self, species: &str) -> Result<f64, ScatteringError> {
        match self.custom_values().get(species) {
            Some(value) => Ok(*value),
            None => self.standard_lookup(species),
        }
    }

    fn set_custom(&mut self, species: &str, value: f64) {
        self.custom_values_mut().insert(species.to_string(), value);
    }

    fn reset_custom(&mut self, species: &str) {
        self.custom_values_mut().remove(species);
    }

    fn reset_all(&mut self) {
        self.custom_values_mut().clear();
    }

    fn custom_species(&self) -> BTreeSet<String> {
        self.custom_values().keys().cloned().collect()
    }
}

impl crate::core::registry::Prototype for dyn ScatteringFactorTable {
    fn type_tag(&self) -> &str {
        ScatteringFactorTable::type_tag(self)
    }

    fn create(&self) -> Box<Self> {
        ScatteringFactorTable::create(self)
    }
}

impl Clone for Box<dyn ScatteringFactorTable> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

static SCATTERING_TABLES: LazyLock<TypeRegistry<dyn ScatteringFactorTable>> =
    LazyLock::new(|| {
        TypeRegistry::with_builtins(
            "scattering factor table",
            vec![
                Box::new(XrayScatteringTable::default()) as Box<dyn ScatteringFactorTable>,
                Box::new(NeutronScatteringTable::default()),
            ],
        )
    });

pub fn create_scattering_table(
    tag: &str,
) -> Result<Box<dyn ScatteringFactorTable>, RegistryError> {
    SCATTERING_TABLES.create(tag)
}

pub fn register_scattering_table(
    prototype: Box<dyn ScatteringFactorTable>,
) -> Result<(), RegistryError> {
    SCATTERING_TABLES.register(prototype)
}

pub fn scattering_table_types() -> BTreeSet<String> {
    SCATTERING_TABLES.tags()
}

/// Electron count `Z - charge`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XrayScatteringTable {
    custom: BTreeMap<String, f64>,
}

impl ScatteringFactorTable for XrayScatteringTable {
    fn type_tag(&self) -> &'static str {
        "xray"
    }

    fn radiation_type(&self) -> &'static str {
        "X"
    }

    fn standard_lookup(&self, species: &str) -> Result<f64, ScatteringError> {
        let (symbol, charge) = parse_species(species);
        ATOMIC_NUMBERS
            .get(symbol.as_str())
            .map(|&z| z as f64 - charge)
            .ok_or_else(|| ScatteringError::UnknownSpecies {
                table: "xray",
                species: species.to_string(),
            })
    }

    fn custom_values(&self) -> &BTreeMap<String, f64> {
        &self.custom
    }

    fn custom_values_mut(&mut self) -> &mut BTreeMap<String, f64> {
        &mut self.custom
    }

    fn create(&self) -> Box<dyn ScatteringFactorTable> {
        Box::new(XrayScatteringTable::default())
    }

    fn clone_box(&self) -> Box<dyn ScatteringFactorTable> {
        Box::new(self.clone())
    }
}

/// Coherent neutron scattering length in fm; ionic charge is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeutronScatteringTable {
    custom: BTreeMap<String, f64>,
}

impl ScatteringFactorTable for NeutronScatteringTable {
    fn type_tag(&self) -> &'static str {
        "neutron"
    }

    fn radiation_type(&self) -> &'static str {
        "N"
    }

    fn standard_lookup(&self, species: &str) -> Result<f64, ScatteringError> {
        let (symbol, _) = parse_species(species);
        NEUTRON_SCATTERING_LENGTHS
            .get(symbol.as_str())
            .copied()
            .ok_or_else(|| ScatteringError::UnknownSpecies {
                table: "neutron",
                species: species.to_string(),
            })
    }

    fn custom_values(&self) -> &BTreeMap<String, f64> {
        &self.custom
    }

    fn custom_values_mut(&mut self) -> &mut BTreeMap<String, f64> {
        &mut self.custom
    }

    fn create(&self) -> Box<dyn ScatteringFactorTable> {
        Box::new(NeutronScatteringTable::default())
    }

    fn clone_box(&self) -> Box<dyn ScatteringFactorTable> {
        Box::new(self.clone())
    }
}
