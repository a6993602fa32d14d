//! summarize a torsion-scan SDF file per molecule and look up each molecule
//! in the structure-search service

use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use log::{info, warn};
use qmscan::{
    atb::{self, AtbClient},
    group, print_results,
    sdf::{self, ParseMode, SdfFile},
    Error,
};

#[derive(Parser)]
struct Cli {
    /// The path to the SDF file containing the torsion-scan records.
    molecule_file: PathBuf,

    /// Where to write the per-molecule summary table.
    #[arg(short, long, default_value = "qm.csv")]
    output: PathBuf,

    /// Abort on unrecognized lines and unterminated trailing blocks instead
    /// of dropping them.
    #[arg(long)]
    strict: bool,

    /// The number of threads to use for the structure lookups. The default
    /// of 1 issues the lookups sequentially.
    #[arg(short, long, default_value_t = 1)]
    threads: usize,

    /// The base URL of the structure-search service.
    #[arg(long, default_value = atb::DEFAULT_BASE_URL)]
    base_url: String,
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("ERROR: {e}");
        exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    if !cli.molecule_file.exists() {
        return Err(Error::MissingInput(cli.molecule_file));
    }

    let mode = if cli.strict {
        ParseMode::Strict
    } else {
        ParseMode::Lenient
    };
    let SdfFile { records, stats } = sdf::read_sdf(&cli.molecule_file, mode)?;
    info!(
        "parsed {} records from {}",
        records.len(),
        cli.molecule_file.display()
    );
    if stats.skipped_lines > 0 {
        warn!("dropped {} unrecognized lines", stats.skipped_lines);
    }
    if stats.unterminated_block {
        warn!("dropped an unterminated trailing block");
    }

    let groups = group::group_by_smiles(&records)?;
    let rows = group::summarize(&groups)?;
    group::write_summary(&cli.output, &rows)?;
    info!("wrote {} rows to {}", rows.len(), cli.output.display());

    // the summary is already durable, whatever the lookups do next
    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads)
        .build_global()?;
    let client = AtbClient::new(cli.base_url);
    let results = atb::lookup_groups(&client, &groups)?;
    print_results(&results);

    Ok(())
}
