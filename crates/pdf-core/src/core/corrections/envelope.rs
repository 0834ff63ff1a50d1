use crate::core::attributes::{AttributeError, Attributes, require_finite};
use crate::core::registry::{RegistryError, TypeRegistry};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

/// Multiplicative factor applied to the PDF at each grid point.
pub trait PdfEnvelope: Attributes + Send + Sync + fmt::Debug {
    fn type_tag(&self) -> &'static str;

    fn value(&self, r: f64) -> f64;

    fn create(&self) -> Box<dyn PdfEnvelope>;

    fn clone_box(&self) -> Box<dyn PdfEnvelope>;
}

impl crate::core::registry::Prototype for dyn PdfEnvelope {
    fn type_tag(&self) -> &str {
        PdfEnvelope::type_tag(self)
    }

    fn create(&self) -> Box<Self> {
        PdfEnvelope::create(self)
    }
}

impl Clone for Box<dyn PdfEnvelope> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

static ENVELOPES: LazyLock<TypeRegistry<dyn PdfEnvelope>> = LazyLock::new(|| {
    TypeRegistry::with_builtins(
        "PDF envelope",
        vec![
            Box::new(ScaleEnvelope::default()) as Box<dyn PdfEnvelope>,
            Box::new(QResolutionEnvelope::default()),
            Box::new(SphericalShapeEnvelope::default()),
            Box::new(StepCutEnvelope::default()),
        ],
    )
});

pub fn create_envelope(tag: &str) -> Result<Box<dyn PdfEnvelope>, RegistryError> {
    ENVELOPES.create(tag)
}

pub fn register_envelope(prototype: Box<dyn PdfEnvelope>) -> Result<(), RegistryError> {
    ENVELOPES.register(prototype)
}

pub fn envelope_types() -> BTreeSet<String> {
    ENVELOPES.tags()
}

/// Overall scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleEnvelope {
    pub scale: f64,
}

impl Default for ScaleEnvelope {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl Attributes for ScaleEnvelope {
    fn attribute_names(&self) -> &'static [&'static str] {
        &["scale"]
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        (name == "scale").then_some(self.scale)
    }

    fn set_attribute(&mut self, name: &str, value: f64) -> Result<(), AttributeError> {
        match name {
            "scale" => {
                self.scale = require_finite(name, value)?;
                Ok(())
            }
            _ => Err(AttributeError::unknown(self.type_tag(), name)),
        }
    }
}

impl PdfEnvelope for ScaleEnvelope {
    fn type_tag(&self) -> &'static str {
        "scale"
    }

    fn value(&self, _r: f64) -> f64 {
        self.scale
    }

    fn create(&self) -> Box<dyn PdfEnvelope> {
        Box::new(ScaleEnvelope::default())
    }

    fn clone_box(&self) -> Box<dyn PdfEnvelope> {
        Box::new(*self)
    }
}

/// Gaussian damping `exp(-(qdamp·r)²/2)` from finite instrument Q resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QResolutionEnvelope {
    pub qdamp: f64,
}

impl Attributes for QResolutionEnvelope {
    fn attribute_names(&self) -> &'static [&'static str] {
        &["qdamp"]
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        (name == "qdamp").then_some(self.qdamp)
    }

    fn set_attribute(&mut self, name: &str, value: f64) -> Result<(), AttributeError> {
        match name {
            "qdamp" => {
                self.qdamp = require_finite(name, value)?;
                Ok(())
            }
            _ => Err(AttributeError::unknown(self.type_tag(), name)),
        }
    }
}

impl PdfEnvelope for QResolutionEnvelope {
    fn type_tag(&self) -> &'static str {
        "qresolution"
    }

    fn value(&self, r: f64) -> f64 {
        if self.qdamp == 0.0 {
            return 1.0;
        }
        (-0.5 * (self.qdamp * r).powi(2)).exp()
    }

    fn create(&self) -> Box<dyn PdfEnvelope> {
        Box::new(QResolutionEnvelope::default())
    }

    fn clone_box(&self) -> Box<dyn PdfEnvelope> {
        Box::new(*self)
    }
}

/// Characteristic function of a solid sphere with diameter `spdiameter`.
/// Disabled while the diameter is not positive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SphericalShapeEnvelope {
    pub spdiameter: f64,
}

impl Attributes for SphericalShapeEnvelope {
    fn attribute_names(&self) -> &'static [&'static str] {
        &["spdiameter"]
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        (name == "spdiameter").then_some(self.spdiameter)
    }

    fn set_attribute(&mut self, name: &str, value: f64) -> Result<(), AttributeError> {
        match name {
            "spdiameter" => {
                self.spdiameter = require_finite(name, value)?;
                Ok(())
            }
            _ => Err(AttributeError::unknown(self.type_tag(), name)),
        }
    }
}

impl PdfEnvelope for SphericalShapeEnvelope {
    fn type_tag(&self) -> &'static str {
        "sphericalshape"
    }

    fn value(&self, r: f64) -> f64 {
        if self.spdiameter <= 0.0 {
            return 1.0;
        }
        let x = r / self.spdiameter;
        if x < 1.0 {
            1.0 - 1.5 * x + 0.5 * x.powi(3)
        } else {
            0.0
        }
    }

    fn create(&self) -> Box<dyn PdfEnvelope> {
        Box::new(SphericalShapeEnvelope::default())
    }

    fn clone_box(&self) -> Box<dyn PdfEnvelope> {
        Box::new(*self)
    }
}

/// Zeroes the PDF beyond `stepcut`. Disabled while the cutoff is not positive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepCutEnvelope {
    pub stepcut: f64,
}

impl Attributes for StepCutEnvelope {
    fn attribute_names(&self) -> &'static [&'static str] {
        &["stepcut"]
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        (name == "stepcut").then_some(self.stepcut)
    }

    fn set_attribute(&mut self, name: &str, value: f64) -> Result<(), AttributeError> {
        match name {
            "stepcut" => {
                self.stepcut = require_finite(name, value)?;
                Ok(())
            }
            _ => Err(AttributeError::unknown(self.type_tag(), name)),
        }
    }
}

impl PdfEnvelope for StepCutEnvelope {
    fn type_tag(&self) -> &'static str {
        "stepcut"
    }

    fn value(&self, r: f64) -> f64 {
        if self.stepcut > 0.0 && r > self.stepcut {
            0.0
        } else {
            1.0
        }
    }

    fn create(&self) -> Box<dyn PdfEnvelope> {
        Box::new(StepCutEnvelope::default())
    }

    fn clone_box(&self) -> Box<dyn PdfEnvelope> {
        Box::new(*self)
    }
}
