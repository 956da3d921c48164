//! PFM parsing and PWM scanning
//!
//! Motifs come in the gimme PFM format: a `>name` header followed by
//! one row per position with the A, C, G and T counts or frequencies.
//! Each motif is turned into a log-odds PWM against a uniform
//! background and scanned on both strands of a sequence.

use anyhow::{bail, Context, Result};
use config::{BACKGROUND, NUCLEOTIDES, PSEUDOCOUNT};
use hashbrown::HashSet;
use log::info;

use std::path::Path;

/// nucleotide code for anything that is not A, C, G or T
pub const INVALID: u8 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Motif {
    pub name: String,
    pwm: Vec<[f64; NUCLEOTIDES]>,
    rc: Vec<[f64; NUCLEOTIDES]>,
    min: f64,
    max: f64,
}

impl Motif {
    /// build a motif from raw rows (counts or frequencies)
    pub fn from_rows(name: &str, rows: &[[f64; NUCLEOTIDES]]) -> Result<Self> {
        if rows.is_empty() {
            bail!("motif {} has no positions", name);
        }

        let pwm = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let total = row.iter().sum::<f64>();
                if total <= 0.0 || row.iter().any(|v| *v < 0.0 || !v.is_finite()) {
                    bail!("motif {} has an invalid row at position {}", name, i + 1);
                }

                let mut scores = [0.0; NUCLEOTIDES];
                for (score, count) in scores.iter_mut().zip(row.iter()) {
                    let freq = (count / total + PSEUDOCOUNT) / (1.0 + NUCLEOTIDES as f64 * PSEUDOCOUNT);
                    *score = (freq / BACKGROUND).log2();
                }

                Ok(scores)
            })
            .collect::<Result<Vec<_>>>()?;

        // complement of A,C,G,T is T,G,C,A -> index 3 - b
        let rc = pwm
            .iter()
            .rev()
            .map(|row| [row[3], row[2], row[1], row[0]])
            .collect::<Vec<_>>();

        let min = pwm.iter().map(|row| row.iter().cloned().fold(f64::INFINITY, f64::min)).sum();
        let max = pwm.iter().map(|row| row.iter().cloned().fold(f64::NEG_INFINITY, f64::max)).sum();

        Ok(Self {
            name: name.to_string(),
            pwm,
            rc,
            min,
            max,
        })
    }

    pub fn len(&self) -> usize {
        self.pwm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pwm.is_empty()
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// best log-odds score over both strands of an encoded sequence;
    /// windows with a non-ACGT base are skipped
    pub fn best_score(&self, codes: &[u8]) -> Option<f64> {
        let width = self.len();
        if self.is_empty() || codes.len() < width {
            return None;
        }

        let mut best: Option<f64> = None;
        for window in codes.windows(width) {
            if window.iter().any(|&c| c == INVALID) {
                continue;
            }

            let fwd = score_window(&self.pwm, window);
            let rev = score_window(&self.rc, window);
            let score = fwd.max(rev);

            best = Some(best.map_or(score, |b| b.max(score)));
        }

        best
    }

    /// best score rescaled to [0, 1] between the worst and best possible scores
    pub fn relative_score(&self, codes: &[u8]) -> f64 {
        let range = self.max - self.min;

        match self.best_score(codes) {
            Some(score) if range > 0.0 => ((score - self.min) / range).clamp(0.0, 1.0),
            Some(_) => 1.0,
            None => 0.0,
        }
    }
}

#[inline(always)]
fn score_window(matrix: &[[f64; NUCLEOTIDES]], window: &[u8]) -> f64 {
    matrix
        .iter()
        .zip(window.iter())
        .map(|(row, &code)| row[code as usize])
        .sum()
}

/// encode a sequence as 0..=3 for A,C,G,T and INVALID for anything else
pub fn encode(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .map(|b| match b.to_ascii_uppercase() {
            b'A' => 0,
            b'C' => 1,
            b'G' => 2,
            b'T' => 3,
            _ => INVALID,
        })
        .collect()
}

pub fn read_pfm<P: AsRef<Path>>(path: P) -> Result<Vec<Motif>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("ERROR: cannot read motif file {}", path.display()))?;

    let motifs = parse_pfm(&contents)
        .with_context(|| format!("ERROR: in motif file {}", path.display()))?;

    info!("Motifs parsed: {}", motifs.len());
    Ok(motifs)
}

pub fn parse_pfm(contents: &str) -> Result<Vec<Motif>> {
    let mut motifs = Vec::new();
    let mut names = HashSet::new();
    let mut current: Option<(String, Vec<[f64; NUCLEOTIDES]>)> = None;

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            if let Some((name, rows)) = current.take() {
                motifs.push(Motif::from_rows(&name, &rows)?);
            }

            let name = header
                .split_whitespace()
                .next()
                .with_context(|| format!("line {}: motif header without a name", idx + 1))?
                .to_string();

            if !names.insert(name.clone()) {
                bail!("line {}: duplicated motif name {}", idx + 1, name);
            }

            current = Some((name, Vec::new()));
            continue;
        }

        let (_, rows) = current
            .as_mut()
            .with_context(|| format!("line {}: matrix row before any motif header", idx + 1))?;

        let values = line
            .split_whitespace()
            .map(|v| v.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("line {}: non-numeric value in matrix row", idx + 1))?;

        let row: [f64; NUCLEOTIDES] = values.as_slice().try_into().map_err(|_| {
            anyhow::anyhow!(
                "line {}: expected {} values per row, got {}",
                idx + 1,
                NUCLEOTIDES,
                values.len()
            )
        })?;

        rows.push(row);
    }

    if let Some((name, rows)) = current.take() {
        motifs.push(Motif::from_rows(&name, &rows)?);
    }

    if motifs.is_empty() {
        bail!("no motifs found");
    }

    Ok(motifs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PFM: &str = "# gimme motifs\n\
                       >GATA_like extra\n\
                       0.0 0.0 1.0 0.0\n\
                       1.0 0.0 0.0 0.0\n\
                       0.0 0.0 0.0 1.0\n\
                       1.0 0.0 0.0 0.0\n\
                       \n\
                       >counts\n\
                       10 10 10 10\n\
                       0 40 0 0\n";

    #[test]
    fn test_parse_pfm() {
        let motifs = parse_pfm(PFM).unwrap();

        assert_eq!(motifs.len(), 2);
        assert_eq!(motifs[0].name, "GATA_like");
        assert_eq!(motifs[0].len(), 4);
        assert_eq!(motifs[1].name, "counts");
        assert_eq!(motifs[1].len(), 2);
    }

    #[test]
    fn test_parse_pfm_errors() {
        assert!(parse_pfm("").is_err());
        assert!(parse_pfm("0.25 0.25 0.25 0.25\n").is_err());
        assert!(parse_pfm(">m\n0.5 0.5 0.0\n").is_err());
        assert!(parse_pfm(">m\n0.5 0.5 x 0.0\n").is_err());
        assert!(parse_pfm(">m\n0 0 0 0\n").is_err());
        assert!(parse_pfm(">m\n").is_err());
        assert!(parse_pfm(">m\n1 0 0 0\n>m\n1 0 0 0\n").is_err());
    }

    #[test]
    fn test_best_score_finds_match_on_both_strands() {
        let motif = &parse_pfm(PFM).unwrap()[0];
        let (_, max) = motif.bounds();

        let forward = encode(b"CCCCGATACCCC");
        assert!((motif.best_score(&forward).unwrap() - max).abs() < 1e-9);

        // reverse complement of GATA is TATC
        let reverse = encode(b"CCCCTATCCCCC");
        assert!((motif.best_score(&reverse).unwrap() - max).abs() < 1e-9);

        let absent = encode(b"CCCCCCCCCCCC");
        assert!(motif.best_score(&absent).unwrap() < max);
    }

    #[test]
    fn test_best_score_skips_invalid_windows() {
        let motif = &parse_pfm(PFM).unwrap()[0];

        assert_eq!(motif.best_score(&encode(b"GATNA")), None);
        assert_eq!(motif.best_score(&encode(b"GAT")), None);
        assert!(motif.best_score(&encode(b"NGATA")).is_some());
    }

    #[test]
    fn test_relative_score_bounds() {
        let motif = &parse_pfm(PFM).unwrap()[0];

        assert!((motif.relative_score(&encode(b"AAGATAAA")) - 1.0).abs() < 1e-9);
        assert_eq!(motif.relative_score(&encode(b"NNNNNNNN")), 0.0);

        let weak = motif.relative_score(&encode(b"CCCCCCCC"));
        assert!((0.0..1.0).contains(&weak));
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode(b"ACGTacgtN-"), vec![0, 1, 2, 3, 0, 1, 2, 3, INVALID, INVALID]);
    }
}
