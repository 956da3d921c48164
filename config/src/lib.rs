pub mod fns;
pub mod mods;

pub use fns::*;
pub use mods::*;

// numeric values
pub const MIN_THREADS: usize = 1;
pub const PEAK_WIDTH: u64 = 200;
pub const PSEUDOCOUNT: f64 = 0.01;
pub const BACKGROUND: f64 = 0.25;
pub const NUCLEOTIDES: usize = 4;
pub const OUTPUT_PRECISION: usize = 6;

// file names
pub const BINDING: &str = "binding.txt";
pub const MOTIF2FACTORS_SUFFIX: &str = "motif2factors.txt";
pub const BINDING_HEADER: &str = "factor\tenhancer\tbinding";

// accepted extensions
pub const GENOME_EXTENSIONS: [&str; 7] = [
    "2bit", "fa", "fasta", "fna", "fa.gz", "fasta.gz", "fna.gz",
];
pub const PFM_EXTENSIONS: [&str; 2] = ["pfm", "motif"];
pub const MODEL_EXTENSIONS: [&str; 1] = ["json"];
