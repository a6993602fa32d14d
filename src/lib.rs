use std::path::PathBuf;

pub mod atb;
pub mod group;
pub mod sdf;

/// everything that can abort a run, one variant per failure class
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("can't find {} in the current directory", .0.display())]
    MissingInput(PathBuf),

    #[error("record '{name}' ({id}) has no SMILES property")]
    MissingSmiles { name: String, id: String },

    #[error("record '{name}' ({id}) has no usable scan angle (got {value:?})")]
    BadAngle {
        name: String,
        id: String,
        value: Option<String>,
    },

    #[error("unterminated trailing block starting at '{name}'")]
    UnterminatedBlock { name: String },

    #[error("unrecognized line {lineno} in record '{name}': {line:?}")]
    UnrecognizedLine {
        name: String,
        lineno: usize,
        line: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to write summary: {0}")]
    Csv(#[from] csv::Error),

    #[error("structure search failed: {0}")]
    Search(#[from] ureq::Error),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// print the SMILES to molid mapping as tab-separated pairs on stdout
pub fn print_results(res: &[(String, Vec<u64>)]) {
    for (smiles, molids) in res {
        for molid in molids {
            println!("{smiles}\t{molid}");
        }
    }
}
