use anyhow::{anyhow, bail, Context, Result};
use dashmap::DashMap;
use flate2::read::MultiGzDecoder;
use hashbrown::HashMap;
use log::info;
use memchr::memchr_iter;
use memmap2::Mmap;
use rayon::prelude::*;
use twobit::TwoBitFile;

use std::fs::File;
use std::io::Read;
use std::path::Path;

const FA_NEEDLE: u8 = b'>';

/// In-memory genome: chromosome name -> uppercase sequence
#[derive(Debug, Default)]
pub struct Genome {
    sequences: DashMap<String, Vec<u8>>,
}

impl Genome {
    /// load a .2bit, FASTA or gzipped FASTA genome
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading genome from {}...", path.display());

        let genome = if config::has_extension(path, &["2bit"]) {
            Self::from_twobit(path)?
        } else if config::has_extension(path, &["gz"]) {
            let mut data = Vec::new();
            MultiGzDecoder::new(File::open(path)?)
                .read_to_end(&mut data)
                .with_context(|| format!("ERROR: cannot decompress {}", path.display()))?;
            Self::from_fasta(&data)?
        } else {
            let file = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            Self::from_fasta(&mmap)?
        };

        if genome.is_empty() {
            bail!("ERROR: no sequences found in genome {}", path.display());
        }

        info!("Chromosomes loaded: {}", genome.len());
        Ok(genome)
    }

    fn from_twobit(path: &Path) -> Result<Self> {
        let mut twobit = TwoBitFile::open_and_read(path)
            .map_err(|e| anyhow!("ERROR: cannot open 2bit file {}: {:?}", path.display(), e))?;

        let sequences = DashMap::new();
        for chrom in twobit.chrom_names() {
            let seq = twobit
                .read_sequence(&chrom, ..)
                .map_err(|e| anyhow!("ERROR: cannot read {} from 2bit: {:?}", chrom, e))?
                .to_ascii_uppercase()
                .into_bytes();

            sequences.insert(chrom, seq);
        }

        Ok(Self { sequences })
    }

    /// parse FASTA records in parallel
    pub fn from_fasta(data: &[u8]) -> Result<Self> {
        let first = data.iter().position(|b| !b.is_ascii_whitespace());
        match first {
            None => return Ok(Self::default()),
            Some(pos) if data[pos] != FA_NEEDLE => {
                bail!("ERROR: genome is not a FASTA file (no '>' header found)")
            }
            _ => (),
        }

        // only '>' at the start of a line opens a record
        let headers = memchr_iter(FA_NEEDLE, data)
            .filter(|&pos| pos == 0 || data[pos - 1] == b'\n' || data[pos - 1] == b'\r')
            .collect::<Vec<_>>();

        let sequences = DashMap::new();
        headers
            .par_iter()
            .enumerate()
            .try_for_each(|(i, &start)| -> Result<()> {
                let end = headers.get(i + 1).copied().unwrap_or(data.len());
                let record = &data[start + 1..end];

                let (header, body) = match memchr::memchr(b'\n', record) {
                    Some(nl) => (&record[..nl], &record[nl + 1..]),
                    None => (record, &[][..]),
                };

                let name = std::str::from_utf8(header)?
                    .split_whitespace()
                    .next()
                    .ok_or_else(|| anyhow!("ERROR: FASTA record without a name"))?
                    .to_string();

                let seq = body
                    .iter()
                    .filter(|b| !b.is_ascii_whitespace())
                    .map(|b| b.to_ascii_uppercase())
                    .collect::<Vec<u8>>();

                if sequences.insert(name.clone(), seq).is_some() {
                    bail!("ERROR: duplicated sequence name in genome: {}", name);
                }

                Ok(())
            })?;

        Ok(Self { sequences })
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn chrom_sizes(&self) -> HashMap<String, u64> {
        self.sequences
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().len() as u64))
            .collect()
    }

    /// copy of the half-open region `[start, end)` of `chrom`
    pub fn fetch(&self, chrom: &str, start: u64, end: u64) -> Result<Vec<u8>> {
        let seq = self
            .sequences
            .get(chrom)
            .ok_or_else(|| anyhow!("ERROR: chromosome {} not in genome", chrom))?;

        let (start, end) = (start as usize, end as usize);
        if start > end || end > seq.len() {
            bail!(
                "ERROR: region {}:{}-{} is out of bounds (length {})",
                chrom,
                start,
                end,
                seq.len()
            );
        }

        Ok(seq[start..end].to_vec())
    }
}
