use crate::core::attributes::{AttributeError, Attributes, require_finite};
use crate::core::registry::{RegistryError, TypeRegistry};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

/// Additive baseline evaluated at each grid point.
pub trait PdfBaseline: Attributes + Send + Sync + fmt::Debug {
    fn type_tag(&self) -> &'static str;

    fn value(&self, r: f64) -> f64;

    fn create(&self) -> Box<dyn PdfBaseline>;

    fn clone_box(&self) -> Box<dyn PdfBaseline>;
}

impl crate::core::registry::Prototype for dyn PdfBaseline {
    fn type_tag(&self) -> &str {
        PdfBaseline::type_tag(self)
    }

    fn create(&self) -> Box<Self> {
        PdfBaseline::create(self)
    }
}

impl Clone for Box<dyn PdfBaseline> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

static BASELINES: LazyLock<TypeRegistry<dyn PdfBaseline>> = LazyLock::new(|| {
    TypeRegistry::with_builtins(
        "PDF baseline",
        vec![
            Box::new(ZeroBaseline) as Box<dyn PdfBaseline>,
            Box::new(LinearBaseline::default()),
        ],
    )
});

pub fn create_baseline(tag: &str) -> Result<Box<dyn PdfBaseline>, RegistryError> {
    BASELINES.create(tag)
}

pub fn register_baseline(prototype: Box<dyn PdfBaseline>) -> Result<(), RegistryError> {
    BASELINES.register(prototype)
}

pub fn baseline_types() -> BTreeSet<String> {
    BASELINES.tags()
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZeroBaseline;

impl Attributes for ZeroBaseline {
    fn set_attribute(&mut self, name: &str, _value: f64) -> Result<(), AttributeError> {
        Err(AttributeError::unknown(self.type_tag(), name))
    }
}

impl PdfBaseline for ZeroBaseline {
    fn type_tag(&self) -> &'static str {
        "zero"
    }

    fn value(&self, _r: f64) -> f64 {
        0.0
    }

    fn create(&self) -> Box<dyn PdfBaseline> {
        Box::new(ZeroBaseline)
    }

    fn clone_box(&self) -> Box<dyn PdfBaseline> {
        Box::new(*self)
    }
}

/// `slope · r`. A calculator sets the slope to `-4πρ` for structures with a
/// number density.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinearBaseline {
    pub slope: f64,
}

impl Attributes for LinearBaseline {
    fn attribute_names(&self) -> &'static [&'static str] {
        &["slope"]
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        (name == "slope").then_some(self.slope)
    }

    fn set_attribute(&mut self, name: &str, value: f64) -> Result<(), AttributeError> {
        match name {
            "slope" => {
                self.slope = require_finite(name, value)?;
                Ok(())
            }
            _ => Err(AttributeError::unknown(self.type_tag(), name)),
        }
    }
}

impl PdfBaseline for LinearBaseline {
    fn type_tag(&self) -> &'static str {
        "linear"
    }

    fn value(&self, r: f64) -> f64 {
        self.slope * r
    }

    fn create(&self) -> Box<dyn PdfBaseline> {
        Box::new(LinearBaseline::default())
    }

    fn clone_box(&self) -> Box<dyn PdfBaseline> {
        Box::new(*self)
    }
}
