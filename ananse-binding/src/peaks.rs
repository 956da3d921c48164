//! Enhancer regions and their signal
//!
//! Enhancers are read from a BED-like file (`chrom start end signal`)
//! or from ANANSE region notation (`chrom:start-end signal`). Regions
//! are recentered to a fixed width, checked against the genome and
//! their signal is scaled to [0, 1] according to the enhancer type.

use anyhow::{anyhow, bail, Context, Result};
use config::Etype;
use hashbrown::{HashMap, HashSet};
use log::{info, warn};

use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Peak {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub signal: f64,
}

/// (chrom, start, end, signal) fields of a BED-like or region-notation line
fn split_fields(line: &str) -> Result<(&str, &str, &str, &str), String> {
    let fields = line.split_whitespace().collect::<Vec<_>>();

    match fields[..] {
        [chrom, start, end, signal, ..]
            if start.parse::<u64>().is_ok() && end.parse::<u64>().is_ok() =>
        {
            Ok((chrom, start, end, signal))
        }
        [region, signal, ..] => {
            let (chrom, range) = region
                .rsplit_once(':')
                .ok_or_else(|| format!("cannot parse region '{}'", region))?;
            let (start, end) = range
                .split_once('-')
                .ok_or_else(|| format!("cannot parse region '{}'", region))?;

            Ok((chrom, start, end, signal))
        }
        _ => Err(format!("expected at least 2 fields, got {}", fields.len())),
    }
}

/// a header has non-integer coordinates or a non-numeric signal column
fn is_header(line: &str) -> bool {
    match split_fields(line) {
        Ok((_, start, end, signal)) => {
            start.parse::<u64>().is_err()
                || end.parse::<u64>().is_err()
                || signal.parse::<f64>().is_err()
        }
        Err(_) => true,
    }
}

impl Peak {
    pub fn parse(line: &str) -> Result<Self, String> {
        let (chrom, start, end, signal) = split_fields(line)?;

        let start = start
            .parse::<u64>()
            .map_err(|e| format!("invalid start '{}': {}", start, e))?;
        let end = end
            .parse::<u64>()
            .map_err(|e| format!("invalid end '{}': {}", end, e))?;
        let signal = signal
            .parse::<f64>()
            .map_err(|e| format!("invalid signal '{}': {}", signal, e))?;

        if start >= end {
            return Err(format!("start {} is not before end {}", start, end));
        }
        if !signal.is_finite() || signal < 0.0 {
            return Err(format!("signal must be a finite non-negative number, got {}", signal));
        }

        Ok(Self {
            chrom: chrom.to_string(),
            start,
            end,
            signal,
        })
    }

    /// region name in `chrom:start-end` notation
    pub fn name(&self) -> String {
        format!("{}:{}-{}", self.chrom, self.start, self.end)
    }

    #[inline(always)]
    pub fn mid(&self) -> u64 {
        self.start + (self.end - self.start) / 2
    }
}

fn is_skippable(line: &str) -> bool {
    let line = line.trim();
    line.is_empty()
        || line.starts_with('#')
        || line.starts_with("track")
        || line.starts_with("browser")
}

/// parse all enhancers in `path`; the first data line may be a header
pub fn read_peaks<P: AsRef<Path>>(path: P) -> Result<Vec<Peak>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("ERROR: cannot read enhancer file {}", path.display()))?;

    parse_peaks(&contents).with_context(|| format!("ERROR: in enhancer file {}", path.display()))
}

pub fn parse_peaks(contents: &str) -> Result<Vec<Peak>> {
    let mut peaks = Vec::new();
    let mut seen_data = false;

    for (idx, line) in contents.lines().enumerate() {
        if is_skippable(line) {
            continue;
        }

        if !seen_data && is_header(line) {
            warn!("Skipping header line {}: {}", idx + 1, line.trim());
        } else {
            let peak = Peak::parse(line).map_err(|e| anyhow!("line {}: {}", idx + 1, e))?;
            peaks.push(peak);
        }

        seen_data = true;
    }

    if peaks.is_empty() {
        bail!("no enhancer regions found");
    }

    info!("Enhancers parsed: {}", peaks.len());
    Ok(peaks)
}

/// recenter every region on its midpoint to a fixed `width`
pub fn set_peak_size(peaks: &mut [Peak], width: u64) {
    let half = width / 2;

    peaks.iter_mut().for_each(|peak| {
        let start = peak.mid().saturating_sub(half);
        peak.start = start;
        peak.end = start.saturating_add(width);
    });
}

/// drop regions outside the genome and exact duplicates
pub fn clear_peak(peaks: Vec<Peak>, chrom_sizes: &HashMap<String, u64>) -> Result<Vec<Peak>> {
    let total = peaks.len();
    let (mut outside, mut duplicated) = (0_usize, 0_usize);
    let mut seen = HashSet::new();

    let kept = peaks
        .into_iter()
        .filter(|peak| match chrom_sizes.get(&peak.chrom) {
            Some(size) if peak.end <= *size => true,
            _ => {
                outside += 1;
                false
            }
        })
        .filter(|peak| {
            if seen.insert((peak.chrom.clone(), peak.start, peak.end)) {
                true
            } else {
                duplicated += 1;
                false
            }
        })
        .collect::<Vec<_>>();

    if outside > 0 {
        warn!(
            "Removed {} enhancers on unknown chromosomes or past chromosome ends",
            outside
        );
    }
    if duplicated > 0 {
        warn!("Removed {} duplicated enhancers", duplicated);
    }

    if kept.is_empty() {
        bail!(
            "ERROR: none of the {} enhancers fall inside the genome, check chromosome names",
            total
        );
    }

    Ok(kept)
}

/// scale peak signal to [0, 1]
///
/// H3K27ac signal is log-transformed and min-max scaled, accessibility
/// signal (ATAC, p300) is turned into percentile ranks.
pub fn scale_signal(peaks: &[Peak], etype: Etype) -> Vec<f64> {
    let values = peaks.iter().map(|p| p.signal).collect::<Vec<_>>();

    match etype {
        Etype::Hg38H3K27ac => min_max(&values.iter().map(|v| (v + 1.0).log2()).collect::<Vec<_>>()),
        Etype::Atac | Etype::P300 => percentile_rank(&values),
    }
}

fn min_max(values: &[f64]) -> Vec<f64> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range <= 0.0 {
        return vec![1.0; values.len()];
    }

    values.iter().map(|v| (v - min) / range).collect()
}

fn percentile_rank(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![1.0; n];
    }

    let mut order = (0..n).collect::<Vec<_>>();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    if values[order[0]] == values[order[n - 1]] {
        return vec![1.0; n];
    }

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }

        // ties share their mean rank
        let rank = (i + j) as f64 / 2.0;
        for k in i..=j {
            ranks[order[k]] = rank / (n - 1) as f64;
        }

        i = j + 1;
    }

    ranks
}
