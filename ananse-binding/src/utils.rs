use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::{bail, Result};
use config::{create_writer, BINDING_HEADER, OUTPUT_PRECISION};
use rayon::prelude::*;

use crate::factors::FactorMap;
use crate::model::BindingModel;
use crate::peaks::Peak;

// factors formatted in parallel before each write
const FACTOR_BATCH: usize = 64;

pub struct ParallelCounter {
    pub scanned: AtomicU32,
    pub ambiguous: AtomicU32,
}

impl ParallelCounter {
    fn new() -> Self {
        Self {
            scanned: AtomicU32::new(0),
            ambiguous: AtomicU32::new(0),
        }
    }

    pub fn inc_scanned(&self) {
        self.scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_ambiguous(&self) {
        self.ambiguous.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_counters(&self) -> (f64, f64) {
        (
            self.ambiguous.load(Ordering::Relaxed) as f64,
            self.scanned.load(Ordering::Relaxed) as f64,
        )
    }

    pub fn get_stat(&self) -> (f64, f64) {
        let (ambiguous, scanned) = self.get_counters();
        if scanned == 0.0 {
            return (ambiguous, 0.0);
        }

        (ambiguous, (ambiguous / scanned) * 100.0)
    }
}

impl Default for ParallelCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// write `factor  enhancer  binding` rows, factor-major, returning the row count
///
/// `signal[i]` is the scaled signal of `peaks[i]` and `scores[i][f]` the
/// motif score of factor `f` in `peaks[i]`.
pub fn write_binding<P: AsRef<Path>>(
    outfile: P,
    peaks: &[Peak],
    signal: &[f64],
    scores: &[Vec<f64>],
    factor_map: &FactorMap,
    model: &BindingModel,
) -> Result<usize> {
    if factor_map.is_empty() {
        bail!("ERROR: no factors to write binding predictions for");
    }

    let names = peaks.iter().map(Peak::name).collect::<Vec<_>>();
    let mut writer = create_writer(outfile)?;
    writeln!(writer, "{}", BINDING_HEADER)?;

    let indices = (0..factor_map.len()).collect::<Vec<_>>();
    for batch in indices.chunks(FACTOR_BATCH) {
        let blocks = batch
            .par_iter()
            .map(|&f| {
                let factor = &factor_map.factors[f].0;
                let mut block = String::new();

                for (i, name) in names.iter().enumerate() {
                    let p = model.predict(signal[i], scores[i][f]);
                    block.push_str(&format!(
                        "{}\t{}\t{:.*}\n",
                        factor, name, OUTPUT_PRECISION, p
                    ));
                }

                block
            })
            .collect::<Vec<_>>();

        for block in blocks {
            writer.write_all(block.as_bytes())?;
        }
    }

    writer.flush()?;
    Ok(names.len() * factor_map.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::ModelCoefficients;

    #[test]
    fn test_counter_stat() {
        let counter = ParallelCounter::default();
        assert_eq!(counter.get_stat(), (0.0, 0.0));

        (0..4).for_each(|_| counter.inc_scanned());
        counter.inc_ambiguous();

        assert_eq!(counter.get_stat(), (1.0, 25.0));
    }

    #[test]
    fn test_write_binding_layout() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out").join("binding.txt");

        let peaks = vec![
            Peak {
                chrom: "chr2".to_string(),
                start: 0,
                end: 200,
                signal: 1.0,
            },
            Peak {
                chrom: "chr1".to_string(),
                start: 100,
                end: 300,
                signal: 2.0,
            },
        ];
        let factor_map = FactorMap {
            factors: vec![("GATA1".to_string(), vec![0]), ("SOX9".to_string(), vec![1])],
        };
        // p = sigmoid(motif score)
        let model = BindingModel::new(ModelCoefficients {
            intercept: 0.0,
            signal: 0.0,
            motif: 1.0,
            interaction: 0.0,
        });
        let scores = vec![vec![0.0, 0.0], vec![0.0, 0.0]];

        let rows = write_binding(&out, &peaks, &[0.0, 1.0], &scores, &factor_map, &model).unwrap();
        assert_eq!(rows, 4);

        let contents = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            contents,
            "factor\tenhancer\tbinding\n\
             GATA1\tchr2:0-200\t0.500000\n\
             GATA1\tchr1:100-300\t0.500000\n\
             SOX9\tchr2:0-200\t0.500000\n\
             SOX9\tchr1:100-300\t0.500000\n"
        );
    }

    #[test]
    fn test_write_binding_without_factors() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("binding.txt");

        let peaks = vec![Peak {
            chrom: "chr1".to_string(),
            start: 0,
            end: 200,
            signal: 1.0,
        }];
        let model = BindingModel::from_etype(config::Etype::Atac);

        assert!(write_binding(&out, &peaks, &[1.0], &[vec![]], &FactorMap::default(), &model).is_err());
        assert!(!out.exists());
    }
}
