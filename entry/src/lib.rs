use anyhow::Result;
use ananse_binding::{cli::Args, BindingParams, RunBinding};
use config::CliError;

/// Run the `binding` subcommand
///
/// Fails with [`CliError::MissingInput`] before building anything if
/// the enhancer file does not exist. Otherwise `build` receives the
/// forwarded parameters and the resulting predictor runs once on the
/// enhancer and output paths.
///
/// # Example
///
/// ```rust, no_run
/// use ananse::binding;
/// use ananse_binding::{cli::Args, Binding};
/// use clap::Parser;
///
/// let args = Args::parse_from([
///     "binding", "-r", "enhancers.bed", "-g", "hg38.2bit", "-p", "motifs.pfm",
/// ]);
///
/// binding(&args, Binding::new).unwrap();
/// ```
pub fn binding<B, F>(args: &Args, build: F) -> Result<()>
where
    B: RunBinding,
    F: FnOnce(BindingParams) -> Result<B>,
{
    if !args.fin_rpkm.exists() {
        return Err(CliError::MissingInput(args.fin_rpkm.clone()).into());
    }

    let predictor = build(args.params())?;
    predictor.run_binding(&args.fin_rpkm, &args.outfile)
}
