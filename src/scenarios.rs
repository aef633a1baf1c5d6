//! Inflation × unemployment scenario grid

use crate::error::{Error, Result};
use crate::types::Scenario;

/// Cartesian product of inflation and unemployment values
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioGrid {
    inflation: Vec<f64>,
    unemployment: Vec<f64>,
}

impl ScenarioGrid {
    /// Create a grid; both value lists must be non-empty
    pub fn new(inflation: Vec<f64>, unemployment: Vec<f64>) -> Result<Self> {
        if inflation.is_empty() || unemployment.is_empty() {
            return Err(Error::invalid_input(
                "scenario grid needs at least one inflation and one unemployment value",
            ));
        }
        Ok(Self {
            inflation,
            unemployment,
        })
    }

    /// Inflation values in declaration order
    pub fn inflation(&self) -> &[f64] {
        &self.inflation
    }

    /// Unemployment values in declaration order
    pub fn unemployment(&self) -> &[f64] {
        &self.unemployment
    }

    /// Number of scenarios
    pub fn len(&self) -> usize {
        self.inflation.len() * self.unemployment.len()
    }

    /// Always false, construction rejects empty value lists
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scenario at `index` in [`scenarios`](Self::scenarios) order
    pub fn scenario_at(&self, index: usize) -> Option<Scenario> {
        let per_inflation = self.unemployment().len();
        let inflation = self.inflation().get(index / per_inflation)?;
        let unemployment = self.unemployment()[index % per_inflation];
        Some(Scenario::new(*inflation, unemployment))
    }

    /// Scenarios with inflation as the outer loop
    pub fn scenarios(&self) -> impl Iterator<Item = Scenario> + '_ {
        self.inflation.iter().flat_map(move |&inflation| {
            self.unemployment
                .iter()
                .map(move |&unemployment| Scenario::new(inflation, unemployment))
        })
    }
}
