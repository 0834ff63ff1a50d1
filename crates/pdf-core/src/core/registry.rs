use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

/// Failures of string-tag lookup and registration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown {kind} type '{tag}'")]
    UnknownType { kind: &'static str, tag: String },
    #[error("A {kind} of type '{tag}' is already registered")]
    DuplicateType { kind: &'static str, tag: String },
}

/// A strategy object that can be looked up by its type tag and used to
/// manufacture fresh instances of itself.
///
/// Implemented for the `dyn` strategy traits so that one registry type serves
/// every strategy family.
pub trait Prototype {
    fn type_tag(&self) -> &str;
    fn create(&self) -> Box<Self>;
}

/// Process-wide mapping from type tag to prototype instance.
///
/// Lookups are deterministic regardless of registration order and duplicate
/// tags are rejected. Registration takes a write lock and must complete
/// before the registry is shared with concurrent calculations.
pub struct TypeRegistry<T: ?Sized> {
    kind: &'static str,
    prototypes: RwLock<BTreeMap<String, Box<T>>>,
}

impl<T: ?Sized + Prototype> TypeRegistry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            prototypes: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates a registry pre-populated with `builtins`.
    pub fn with_builtins(kind: &'static str, builtins: Vec<Box<T>>) -> Self {
        let prototypes = builtins
            .into_iter()
            .map(|proto| (proto.type_tag().to_string(), proto))
            .collect();
        Self {
            kind,
            prototypes: RwLock::new(prototypes),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Adds a prototype under its type tag. Existing tags are not replaced.
    pub fn register(&self, prototype: Box<T>) -> Result<(), RegistryError> {
        let mut prototypes = self
            .prototypes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let tag = prototype.type_tag().to_string();
        if prototypes.contains_key(&tag) {
            return Err(RegistryError::DuplicateType {
                kind: self.kind,
                tag,
            });
        }
        prototypes.insert(tag, prototype);
        Ok(())
    }

    /// Returns a fresh instance with default parameters for `tag`.
    pub fn create(&self, tag: &str) -> Result<Box<T>, RegistryError> {
        let prototypes = self
            .prototypes
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        prototypes
            .get(tag)
            .map(|proto| proto.create())
            .ok_or_else(|| RegistryError::UnknownType {
                kind: self.kind,
                tag: tag.to_string(),
            })
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.prototypes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(tag)
    }

    /// All registered tags in sorted order.
    pub fn tags(&self) -> BTreeSet<String> {
        self.prototypes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
