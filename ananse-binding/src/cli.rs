use clap::{ArgAction, Parser};
use config::{Etype, BINDING};
use std::path::PathBuf;

use crate::BindingParams;

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(
        short = 'r',
        long = "enhancers",
        required = true,
        value_name = "PATH",
        help = "Path to enhancer file with signal (BED-like or chrom:start-end)"
    )]
    pub fin_rpkm: PathBuf,

    #[arg(
        short = 'o',
        long = "outfile",
        value_name = "PATH",
        default_value = BINDING,
        help = "Path to output binding file"
    )]
    pub outfile: PathBuf,

    #[arg(
        short = 'n',
        long = "ncore",
        help = "Number of threads",
        value_name = "THREADS",
        default_value_t = num_cpus::get()
    )]
    pub ncore: usize,

    #[arg(
        short = 'g',
        long = "genome",
        required = true,
        value_name = "PATH",
        help = "Path to genome .2bit or FASTA (.fa, .fa.gz) file"
    )]
    pub genome: PathBuf,

    #[arg(
        short = 'p',
        long = "pfmfile",
        required = true,
        value_name = "PATH",
        help = "Path to PFM motif file [expects <name>.motif2factors.txt next to it]"
    )]
    pub pfmfile: PathBuf,

    #[arg(
        long = "include-notfs",
        help = "Flag to keep factors that are not in the TF list",
        value_name = "FLAG",
        default_missing_value("true"),
        default_value("false"),
        num_args(0..=1),
        require_equals(true),
        action = ArgAction::Set,
    )]
    pub include_notfs: bool,

    #[arg(
        long = "rm-curated",
        help = "Flag to keep only curated motif-factor associations",
        value_name = "FLAG",
        default_missing_value("true"),
        default_value("true"),
        num_args(0..=1),
        require_equals(true),
        action = ArgAction::Set,
    )]
    pub rm_curated: bool,

    #[arg(
        short = 'e',
        long = "etype",
        value_name = "TYPE",
        default_value = "hg38H3K27ac",
        help = "Enhancer type: hg38H3K27ac, ATAC or p300"
    )]
    pub etype: Etype,

    #[arg(
        short = 't',
        long = "tffile",
        required = false,
        value_name = "PATH",
        help = "Path to file with transcription factor names, one per line"
    )]
    pub tffile: Option<PathBuf>,

    #[arg(
        short = 'm',
        long = "model",
        required = false,
        value_name = "PATH",
        help = "Path to JSON file with binding model coefficients"
    )]
    pub model: Option<PathBuf>,
}

impl Args {
    /// parameters forwarded to the binding predictor
    pub fn params(&self) -> BindingParams {
        BindingParams {
            ncore: self.ncore,
            genome: self.genome.clone(),
            pfmfile: self.pfmfile.clone(),
            include_notfs: self.include_notfs,
            rm_curated: self.rm_curated,
            etype: self.etype,
            tffile: self.tffile.clone(),
            model: self.model.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from([
            "ananse-binding",
            "-r",
            "enhancers.bed",
            "-g",
            "hg38.2bit",
            "-p",
            "motifs.pfm",
        ]);

        assert_eq!(args.outfile, PathBuf::from(BINDING));
        assert!(!args.include_notfs);
        assert!(args.rm_curated);
        assert_eq!(args.etype, Etype::Hg38H3K27ac);
        assert_eq!(args.tffile, None);
        assert!(args.ncore >= 1);
    }

    #[test]
    fn test_args_params_forwarding() {
        let args = Args::parse_from([
            "ananse-binding",
            "--enhancers",
            "enhancers.bed",
            "--outfile",
            "out/binding.txt",
            "--ncore",
            "3",
            "--genome",
            "hg38.fa.gz",
            "--pfmfile",
            "motifs.pfm",
            "--include-notfs",
            "--rm-curated=false",
            "--etype",
            "ATAC",
            "--tffile",
            "tfs.txt",
        ]);

        assert_eq!(
            args.params(),
            BindingParams {
                ncore: 3,
                genome: PathBuf::from("hg38.fa.gz"),
                pfmfile: PathBuf::from("motifs.pfm"),
                include_notfs: true,
                rm_curated: false,
                etype: Etype::Atac,
                tffile: Some(PathBuf::from("tfs.txt")),
                model: None,
            }
        );
    }

    #[test]
    fn test_args_rejects_unknown_etype() {
        let args = Args::try_parse_from([
            "ananse-binding",
            "-r",
            "enhancers.bed",
            "-g",
            "hg38.2bit",
            "-p",
            "motifs.pfm",
            "-e",
            "dnase",
        ]);

        assert!(args.is_err());
    }
}
