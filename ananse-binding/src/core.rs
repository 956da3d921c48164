use anyhow::{bail, Context, Result};
use config::{
    get_progress_bar, validate, Etype, GENOME_EXTENSIONS, MIN_THREADS, MODEL_EXTENSIONS,
    PEAK_WIDTH, PFM_EXTENSIONS,
};
use log::{info, warn};
use rayon::prelude::*;
use rayon::ThreadPool;

use std::path::Path;

use crate::factors::{
    build_factor_map, motif2factors_path, read_motif2factors, read_tffile, FactorFilter,
    FactorMap,
};
use crate::genome::Genome;
use crate::model::BindingModel;
use crate::motifs::{encode, read_pfm, Motif, INVALID};
use crate::peaks::{clear_peak, read_peaks, scale_signal, set_peak_size, Peak};
use crate::utils::{write_binding, ParallelCounter};
use crate::{BindingParams, RunBinding};

/// Binding predictor configured once per invocation
pub struct Binding {
    params: BindingParams,
    model: BindingModel,
    pool: ThreadPool,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("params", &self.params)
            .field("model", &self.model)
            .finish()
    }
}

impl Binding {
    pub fn new(params: BindingParams) -> Result<Self> {
        if params.ncore < MIN_THREADS {
            bail!(
                "ERROR: number of cores must be at least {}, got {}",
                MIN_THREADS,
                params.ncore
            );
        }

        validate(&params.genome, &GENOME_EXTENSIONS)?;
        validate(&params.pfmfile, &PFM_EXTENSIONS)?;
        if let Some(tffile) = &params.tffile {
            validate(tffile, &[])?;
        }

        let model = match &params.model {
            Some(path) => {
                validate(path, &MODEL_EXTENSIONS)?;
                BindingModel::from_json(path)?
            }
            None => BindingModel::from_etype(params.etype),
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.ncore)
            .build()
            .context("ERROR: cannot build thread pool")?;

        info!(
            "Binding set up with {} threads, enhancer type {}",
            params.ncore, params.etype
        );

        Ok(Self {
            params,
            model,
            pool,
        })
    }

    fn factor_map(&self, motifs: &[Motif]) -> Result<FactorMap> {
        let table = motif2factors_path(&self.params.pfmfile);
        if !table.exists() {
            bail!(
                "ERROR: motif2factors file {} not found next to {}",
                table.display(),
                self.params.pfmfile.display()
            );
        }

        let tfs = match &self.params.tffile {
            Some(path) => Some(read_tffile(path)?),
            None => None,
        };

        let filter = FactorFilter {
            include_notfs: self.params.include_notfs,
            rm_curated: self.params.rm_curated,
            tfs,
        };

        build_factor_map(read_motif2factors(&table)?, motifs, &filter)
    }
}

impl RunBinding for Binding {
    fn run_binding(&self, fin_rpkm: &Path, outfile: &Path) -> Result<()> {
        info!("Predicting binding for {}...", fin_rpkm.display());

        let peaks = read_peaks(fin_rpkm)?;
        let genome = self.pool.install(|| Genome::load(&self.params.genome))?;
        let (peaks, signal) = prepare_peaks(peaks, &genome, self.params.etype)?;

        let motifs = read_pfm(&self.params.pfmfile)?;
        let factor_map = self.factor_map(&motifs)?;

        let scores = self
            .pool
            .install(|| scan_peaks(&peaks, &genome, &motifs, &factor_map))?;

        let rows = self.pool.install(|| {
            write_binding(outfile, &peaks, &signal, &scores, &factor_map, &self.model)
        })?;

        info!(
            "Binding predictions written to {}: {} rows ({} factors x {} enhancers)",
            outfile.display(),
            rows,
            factor_map.len(),
            peaks.len()
        );

        Ok(())
    }
}

/// resize, filter and scale enhancers against `genome`
pub fn prepare_peaks(
    mut peaks: Vec<Peak>,
    genome: &Genome,
    etype: Etype,
) -> Result<(Vec<Peak>, Vec<f64>)> {
    set_peak_size(&mut peaks, PEAK_WIDTH);
    let peaks = clear_peak(peaks, &genome.chrom_sizes())?;
    let signal = scale_signal(&peaks, etype);

    info!("Enhancers kept: {}", peaks.len());
    Ok((peaks, signal))
}

/// motif score of every factor in every peak: `scores[peak][factor]`
pub fn scan_peaks(
    peaks: &[Peak],
    genome: &Genome,
    motifs: &[Motif],
    factor_map: &FactorMap,
) -> Result<Vec<Vec<f64>>> {
    let used = factor_map.used_motifs();
    let mut column = vec![usize::MAX; motifs.len()];
    used.iter().enumerate().for_each(|(c, &m)| column[m] = c);

    info!(
        "Scanning {} enhancers with {} motifs...",
        peaks.len(),
        used.len()
    );

    let counter = ParallelCounter::default();
    let pb = get_progress_bar(peaks.len() as u64, "Scanning motifs...");

    let scores = peaks
        .par_iter()
        .map(|peak| -> Result<Vec<f64>> {
            let codes = encode(&genome.fetch(&peak.chrom, peak.start, peak.end)?);

            counter.inc_scanned();
            if codes.contains(&INVALID) {
                counter.inc_ambiguous();
            }

            let motif_scores = used
                .iter()
                .map(|&m| motifs[m].relative_score(&codes))
                .collect::<Vec<_>>();

            let factor_scores = factor_map
                .factors
                .iter()
                .map(|(_, idxs)| {
                    idxs.iter()
                        .map(|&m| motif_scores[column[m]])
                        .fold(0.0, f64::max)
                })
                .collect::<Vec<_>>();

            pb.inc(1);
            Ok(factor_scores)
        })
        .collect::<Result<Vec<_>>>()?;

    pb.finish_and_clear();

    let (ambiguous, ratio) = counter.get_stat();
    if ambiguous > 0.0 {
        warn!(
            "Enhancers with non-ACGT bases: {:?} ({:.3}%)",
            ambiguous, ratio
        );
    }

    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::parse_motif2factors;
    use crate::motifs::parse_pfm;
    use std::fs;
    use std::path::PathBuf;

    // 400bp chromosome: GATA site around 100, SOX site around 300
    fn chromosome() -> String {
        let mut seq = "C".repeat(400);
        seq.replace_range(98..102, "GATA");
        seq.replace_range(297..303, "ACAATG");
        seq
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        params: BindingParams,
        enhancers: PathBuf,
        outfile: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let genome = root.join("genome.fa");
        fs::write(&genome, format!(">chr1\n{}\n", chromosome())).unwrap();

        let pfmfile = root.join("motifs.pfm");
        fs::write(
            &pfmfile,
            ">gata\n0 0 1 0\n1 0 0 0\n0 0 0 1\n1 0 0 0\n\
             >sox\n1 0 0 0\n0 1 0 0\n1 0 0 0\n1 0 0 0\n0 0 0 1\n0 0 1 0\n",
        )
        .unwrap();
        fs::write(
            root.join("motifs.motif2factors.txt"),
            "Motif\tFactor\tEvidence\tCurated\n\
             gata\tGATA1\tJASPAR\tY\n\
             sox\tSOX9\tJASPAR\tY\n\
             sox\tSOX10\tInferred\tN\n",
        )
        .unwrap();

        let enhancers = root.join("enhancers.bed");
        fs::write(
            &enhancers,
            "chrom\tstart\tend\trpkm\nchr1\t50\t150\t10.0\nchr1\t250\t350\t1.0\nchr2\t0\t100\t5.0\n",
        )
        .unwrap();

        let params = BindingParams {
            ncore: 2,
            genome,
            pfmfile,
            include_notfs: true,
            rm_curated: true,
            etype: Etype::Hg38H3K27ac,
            tffile: None,
            model: None,
        };

        Fixture {
            outfile: root.join("out").join("binding.txt"),
            enhancers,
            params,
            _dir: dir,
        }
    }

    #[test]
    fn test_new_validates_inputs() {
        let fx = fixture();

        let params = BindingParams {
            ncore: 0,
            ..fx.params.clone()
        };
        assert!(Binding::new(params).is_err());

        let params = BindingParams {
            pfmfile: PathBuf::from("/no/such/motifs.pfm"),
            ..fx.params.clone()
        };
        let err = Binding::new(params).unwrap_err();
        assert!(err.to_string().contains("does not exist"));

        let params = BindingParams {
            tffile: Some(PathBuf::from("/no/such/tfs.txt")),
            ..fx.params.clone()
        };
        assert!(Binding::new(params).is_err());

        assert!(Binding::new(fx.params.clone()).is_ok());
    }

    #[test]
    fn test_scan_peaks_scores_factors() {
        let genome = Genome::from_fasta(format!(">chr1\n{}\n", chromosome()).as_bytes()).unwrap();
        let motifs = parse_pfm(
            ">gata\n0 0 1 0\n1 0 0 0\n0 0 0 1\n1 0 0 0\n\
             >sox\n1 0 0 0\n0 1 0 0\n1 0 0 0\n1 0 0 0\n0 0 0 1\n0 0 1 0\n",
        )
        .unwrap();
        let table = parse_motif2factors("Motif\tFactor\ngata\tGATA1\nsox\tSOX9\n").unwrap();
        let factor_map = build_factor_map(table, &motifs, &FactorFilter::default()).unwrap();

        let peaks = vec![
            Peak {
                chrom: "chr1".to_string(),
                start: 50,
                end: 150,
                signal: 1.0,
            },
            Peak {
                chrom: "chr1".to_string(),
                start: 250,
                end: 350,
                signal: 1.0,
            },
        ];

        let scores = scan_peaks(&peaks, &genome, &motifs, &factor_map).unwrap();

        // factors sorted: GATA1, SOX9
        assert!((scores[0][0] - 1.0).abs() < 1e-9);
        assert!(scores[0][1] < 1.0);
        assert!((scores[1][1] - 1.0).abs() < 1e-9);
        assert!(scores[1][0] < 1.0);
    }

    #[test]
    fn test_run_binding_end_to_end() {
        let fx = fixture();
        let binding = Binding::new(fx.params.clone()).unwrap();

        binding.run_binding(&fx.enhancers, &fx.outfile).unwrap();

        let contents = fs::read_to_string(&fx.outfile).unwrap();
        let lines = contents.lines().collect::<Vec<_>>();

        // chr2 is not in the genome; SOX10 is not curated
        assert_eq!(lines[0], "factor\tenhancer\tbinding");
        assert_eq!(lines.len(), 1 + 2 * 2);

        let rows = lines[1..]
            .iter()
            .map(|l| {
                let f = l.split('\t').collect::<Vec<_>>();
                (f[0].to_string(), f[1].to_string(), f[2].parse::<f64>().unwrap())
            })
            .collect::<Vec<_>>();

        assert_eq!(rows[0].0, "GATA1");
        assert_eq!(rows[0].1, "chr1:0-200");
        assert_eq!(rows[1].1, "chr1:200-400");
        assert_eq!(rows[2].0, "SOX9");

        // strong enhancer with its own motif binds best
        assert!(rows[0].2 > rows[1].2);
        assert!(rows.iter().all(|r| (0.0..=1.0).contains(&r.2)));
    }

    #[test]
    fn test_run_binding_missing_motif2factors() {
        let fx = fixture();
        fs::remove_file(fx.params.pfmfile.with_extension("motif2factors.txt")).unwrap();

        let binding = Binding::new(fx.params.clone()).unwrap();
        assert!(binding.run_binding(&fx.enhancers, &fx.outfile).is_err());
        assert!(!fx.outfile.exists());
    }
}
