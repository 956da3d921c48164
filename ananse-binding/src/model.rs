use anyhow::{Context, Result};
use config::{Etype, ModelCoefficients};
use log::info;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Logistic model turning (peak signal, motif score) into a binding probability
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindingModel {
    coefficients: ModelCoefficients,
}

impl BindingModel {
    pub fn new(coefficients: ModelCoefficients) -> Self {
        Self { coefficients }
    }

    pub fn from_etype(etype: Etype) -> Self {
        Self::new(etype.coefficients())
    }

    /// read coefficients from a JSON object with the keys
    /// `intercept`, `signal`, `motif` and `interaction`
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(
            File::open(path)
                .with_context(|| format!("ERROR: cannot open model file {}", path.display()))?,
        );

        let coefficients: ModelCoefficients = serde_json::from_reader(reader)
            .with_context(|| format!("ERROR: invalid model file {}", path.display()))?;

        info!("Using binding model from {}: {:?}", path.display(), coefficients);
        Ok(Self::new(coefficients))
    }

    pub fn coefficients(&self) -> &ModelCoefficients {
        &self.coefficients
    }

    #[inline(always)]
    pub fn predict(&self, signal: f64, motif: f64) -> f64 {
        1.0 / (1.0 + (-self.coefficients.logit(signal, motif)).exp())
    }
}
