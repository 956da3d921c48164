use anyhow::{bail, Context, Result};
use config::MOTIF2FACTORS_SUFFIX;
use hashbrown::{HashMap, HashSet};
use log::{info, warn};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::motifs::Motif;

/// one row of a motif2factors table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub motif: String,
    pub factor: String,
    pub evidence: Option<String>,
    pub curated: Option<bool>,
}

/// which associations survive before building the factor map
#[derive(Debug, Clone, Default)]
pub struct FactorFilter {
    pub include_notfs: bool,
    pub rm_curated: bool,
    pub tfs: Option<HashSet<String>>,
}

/// factor -> indices of its motifs, sorted by factor
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FactorMap {
    pub factors: Vec<(String, Vec<usize>)>,
}

impl FactorMap {
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// motif indices referenced by at least one factor, ascending
    pub fn used_motifs(&self) -> Vec<usize> {
        let mut used = self
            .factors
            .iter()
            .flat_map(|(_, motifs)| motifs.iter().copied())
            .collect::<Vec<_>>();
        used.sort_unstable();
        used.dedup();
        used
    }
}

/// `gimme.vertebrate.v5.0.pfm` -> `gimme.vertebrate.v5.0.motif2factors.txt`
pub fn motif2factors_path<P: AsRef<Path>>(pfmfile: P) -> PathBuf {
    pfmfile.as_ref().with_extension(MOTIF2FACTORS_SUFFIX)
}

pub fn read_motif2factors<P: AsRef<Path>>(path: P) -> Result<Vec<Association>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("ERROR: cannot read motif2factors file {}", path.display()))?;

    parse_motif2factors(&contents)
        .with_context(|| format!("ERROR: in motif2factors file {}", path.display()))
}

pub fn parse_motif2factors(contents: &str) -> Result<Vec<Association>> {
    let mut lines = contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with('#'));

    let (_, header) = lines.next().context("empty table")?;
    let columns = header
        .split('\t')
        .map(|c| c.trim().to_ascii_lowercase())
        .collect::<Vec<_>>();
    let column = |name: &str| columns.iter().position(|c| c == name);

    let motif_idx = column("motif").context("header has no 'Motif' column")?;
    let factor_idx = column("factor").context("header has no 'Factor' column")?;
    let evidence_idx = column("evidence");
    let curated_idx = column("curated");

    lines
        .map(|(idx, line)| -> Result<Association> {
            let fields = line.split('\t').map(str::trim).collect::<Vec<_>>();
            let field = |i: usize| {
                fields
                    .get(i)
                    .copied()
                    .filter(|f| !f.is_empty())
                    .with_context(|| format!("line {}: missing column {}", idx + 1, i + 1))
            };

            let curated = match curated_idx {
                Some(i) => Some(parse_flag(field(i)?).with_context(|| {
                    format!("line {}: invalid value in 'Curated' column", idx + 1)
                })?),
                None => None,
            };

            Ok(Association {
                motif: field(motif_idx)?.to_string(),
                factor: field(factor_idx)?.to_string(),
                evidence: evidence_idx
                    .and_then(|i| fields.get(i))
                    .map(|e| e.to_string())
                    .filter(|e| !e.is_empty()),
                curated,
            })
        })
        .collect()
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Ok(true),
        "n" | "no" | "false" | "0" => Ok(false),
        _ => bail!("expected Y or N, got '{}'", value),
    }
}

/// one factor per line (first column), case-insensitive
pub fn read_tffile<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("ERROR: cannot read TF file {}", path.display()))?;

    let tfs = contents
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().next())
        .map(|tf| tf.to_ascii_uppercase())
        .collect::<HashSet<_>>();

    if tfs.is_empty() {
        bail!("ERROR: TF file {} lists no factors", path.display());
    }

    info!("Transcription factors listed: {}", tfs.len());
    Ok(tfs)
}

/// filter motif-factor associations and index them against `motifs`
pub fn build_factor_map(
    associations: Vec<Association>,
    motifs: &[Motif],
    filter: &FactorFilter,
) -> Result<FactorMap> {
    let total = associations.len();
    let mut associations = associations;

    if filter.rm_curated {
        if associations.iter().any(|a| a.curated.is_none()) {
            warn!("No 'Curated' column in motif2factors table, keeping all associations");
        } else {
            associations.retain(|a| a.curated == Some(true));
        }
    }

    match (&filter.tfs, filter.include_notfs) {
        (Some(tfs), false) => {
            associations.retain(|a| tfs.contains(&a.factor.to_ascii_uppercase()));
        }
        (None, false) => {
            warn!("No TF list provided, keeping every factor in the motif2factors table");
        }
        (_, true) => (),
    }

    let index = motifs
        .iter()
        .enumerate()
        .map(|(i, m)| (m.name.as_str(), i))
        .collect::<HashMap<_, _>>();

    let mut unknown = 0_usize;
    let mut factors: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for association in associations.iter() {
        match index.get(association.motif.as_str()) {
            Some(&i) => {
                let motifs = factors.entry(association.factor.clone()).or_default();
                if !motifs.contains(&i) {
                    motifs.push(i);
                }
            }
            None => unknown += 1,
        }
    }

    if unknown > 0 {
        warn!(
            "Dropped {} associations whose motif is not in the motif file",
            unknown
        );
    }

    if factors.is_empty() {
        bail!(
            "ERROR: none of the {} motif-factor associations passed the filters",
            total
        );
    }

    info!(
        "Factors kept: {} (from {} associations)",
        factors.len(),
        total
    );

    Ok(FactorMap {
        factors: factors.into_iter().collect(),
    })
}
