//! ananse-binding: transcription factor binding prediction
//!
//! Combines the signal of enhancer regions (H3K27ac, ATAC or p300)
//! with the best PWM match of each factor's motifs inside those
//! regions, and turns both into a binding probability for every
//! (factor, enhancer) pair.

pub mod cli;
pub mod core;
pub mod factors;
pub mod genome;
pub mod model;
pub mod motifs;
pub mod peaks;
pub mod utils;

use config::Etype;
use std::path::{Path, PathBuf};

pub use crate::core::Binding;

/// Parameters a binding predictor is built from
#[derive(Debug, Clone, PartialEq)]
pub struct BindingParams {
    pub ncore: usize,
    pub genome: PathBuf,
    pub pfmfile: PathBuf,
    pub include_notfs: bool,
    pub rm_curated: bool,
    pub etype: Etype,
    pub tffile: Option<PathBuf>,
    pub model: Option<PathBuf>,
}

pub trait RunBinding {
    /// predict binding for the enhancers in `fin_rpkm` and write them to `outfile`
    fn run_binding(&self, fin_rpkm: &Path, outfile: &Path) -> anyhow::Result<()>;
}
