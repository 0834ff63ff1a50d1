use crate::core::scattering::{ScatteringError, ScatteringFactorTable};
use crate::core::structure::StructureAdapter;

/// Per-structure data gathered once at the start of an evaluation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StructureCache {
    /// Scattering power times occupancy for each site.
    pub sf_site: Vec<f64>,
    pub multiplicity: Vec<f64>,
    /// Sum of `occupancy · multiplicity`.
    pub total_occupancy: f64,
    /// Occupancy-weighted mean scattering power.
    pub sf_average: f64,
    pub number_density: f64,
}

impl StructureCache {
    /// Collects scattering powers and occupancies of `structure` from `table`.
    pub fn build(
        structure: &dyn StructureAdapter,
        table: &dyn ScatteringFactorTable,
    ) -> Result<Self, ScatteringError> {
        let n = structure.count_sites();
        let mut sf_site = Vec::with_capacity(n);
        let mut multiplicity = Vec::with_capacity(n);
        let mut total_sf = 0.0;

        for i in 0..n {
            let sf = table.lookup(structure.site_atom_type(i))? * structure.site_occupancy(i);
            let mult = structure.site_multiplicity(i) as f64;
            total_sf += sf * mult;
            sf_site.push(sf);
            multiplicity.push(mult);
        }

        let total_occupancy = structure.total_occupancy();
        let sf_average = if total_occupancy > 0.0 {
            total_sf / total_occupancy
        } else {
            0.0
        };

        Ok(Self {
            sf_site,
            multiplicity,
            total_occupancy,
            sf_average,
            number_density: structure.number_density(),
        })
    }

    /// Factor turning the raw histogram into an RDF, 0 for an empty structure.
    pub fn rdf_scale(&self) -> f64 {
        let denominator = self.total_occupancy * self.sf_average * self.sf_average;
        if denominator > 0.0 {
            2.0 / denominator
        } else {
            0.0
        }
    }
}
