use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

// os
#[cfg(not(windows))]
const TICK_SETTINGS: (&str, u64) = ("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ", 80);
#[cfg(windows)]
const TICK_SETTINGS: (&str, u64) = (r"+-x| ", 200);

/// return a pre-configured progress bar
pub fn get_progress_bar(length: u64, msg: &str) -> ProgressBar {
    let progressbar_style = ProgressStyle::default_spinner()
        .tick_chars(TICK_SETTINGS.0)
        .template(" {spinner} {msg:<30} {wide_bar} ETA {eta_precise} ")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let progress_bar = ProgressBar::new(length);

    progress_bar.set_style(progressbar_style);
    progress_bar.enable_steady_tick(Duration::from_millis(TICK_SETTINGS.1));
    progress_bar.set_message(msg.to_owned());

    progress_bar
}

/// open a buffered writer on `fname`, creating parent dirs if needed
pub fn create_writer<P: AsRef<Path>>(fname: P) -> Result<BufWriter<File>, CliError> {
    let fname = fname.as_ref();

    if let Some(parent) = fname.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    Ok(BufWriter::new(File::create(fname)?))
}

/// error handling for CLI
#[derive(Debug, Error)]
pub enum CliError {
    #[error("File {} does not exist!", .0.display())]
    MissingInput(PathBuf),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// argument validation
///
/// A path is accepted if it exists, is a regular file, is not empty
/// and its name ends with one of `extensions` (compound ones like
/// `fa.gz` included). An empty `extensions` slice accepts any name.
pub fn validate<P: AsRef<Path>>(arg: P, extensions: &[&str]) -> Result<(), CliError> {
    let arg = arg.as_ref();

    if !arg.exists() {
        return Err(CliError::MissingInput(arg.to_path_buf()));
    }

    if !arg.is_file() {
        return Err(CliError::InvalidInput(format!("{:?} is not a file", arg)));
    }

    if !extensions.is_empty() && !has_extension(arg, extensions) {
        return Err(CliError::InvalidInput(format!(
            "file {:?} has none of the expected extensions: {}",
            arg,
            extensions.join(", ")
        )));
    }

    match std::fs::metadata(arg) {
        Ok(metadata) if metadata.len() == 0 => {
            Err(CliError::InvalidInput(format!("file {:?} is empty", arg)))
        }
        Ok(_) => Ok(()),
        Err(e) => Err(CliError::IoError(e)),
    }
}

/// case-insensitive check on the (possibly compound) extension of a path
pub fn has_extension<P: AsRef<Path>>(path: P, extensions: &[&str]) -> bool {
    let name = match path.as_ref().file_name().and_then(|f| f.to_str()) {
        Some(name) => name.to_ascii_lowercase(),
        None => return false,
    };

    extensions
        .iter()
        .any(|ext| name.ends_with(&format!(".{}", ext.to_ascii_lowercase())))
}
