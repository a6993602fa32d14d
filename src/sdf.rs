//! best-effort reader for SDF-style torsion-scan result files. blocks are
//! delimited by `$$$$` lines, and the lines inside a block are classified by
//! their exact length rather than by a full V2000 connection-table parse.

use std::{collections::HashMap, fs::read_to_string, path::Path};

use log::{debug, warn};

use crate::Error;

/// atom lines are 70 (with coordinates and charge columns) or 40 bytes long
const ATOM_LINE_LENGTHS: [usize; 2] = [70, 40];

/// bond lines are always 22 bytes long
const BOND_LINE_LENGTH: usize = 22;

/// what to do with input the classifier does not recognize
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// drop unrecognized lines and unterminated trailing blocks, counting
    /// them in [ParseStats]
    #[default]
    Lenient,
    /// treat anything [ParseMode::Lenient] would drop as an error
    Strict,
}

/// counters for input dropped in [ParseMode::Lenient]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// lines that were neither positional, property, atom, nor bond lines
    pub skipped_lines: usize,
    /// whether the file ended in the middle of a block
    pub unterminated_block: bool,
}

/// one parsed molecule block
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MoleculeRecord {
    pub name: String,
    pub id: String,
    pub software: String,
    pub properties: HashMap<String, String>,
    pub atom_lines: Vec<String>,
    pub bond_lines: Vec<String>,
}

impl MoleculeRecord {
    /// the SMILES property, used downstream as the grouping key. a record
    /// without one is a data-integrity error
    pub fn smiles(&self) -> Result<&str, Error> {
        self.properties.get("SMILES").map(String::as_str).ok_or_else(|| {
            Error::MissingSmiles {
                name: self.name.clone(),
                id: self.id.clone(),
            }
        })
    }

    /// the torsion angle this conformer was scanned at, in degrees. a
    /// missing or unparseable `ScanVar_1` property is an error carrying the
    /// raw value for diagnosis
    pub fn scan_angle(&self) -> Result<f64, Error> {
        let Some(raw) = self.properties.get("ScanVar_1") else {
            return Err(Error::BadAngle {
                name: self.name.clone(),
                id: self.id.clone(),
                value: None,
            });
        };
        raw.parse().map_err(|_| Error::BadAngle {
            name: self.name.clone(),
            id: self.id.clone(),
            value: Some(raw.clone()),
        })
    }

    /// reconstruct a minimal SDF blob for the structure-search service:
    /// three placeholder header lines, the stored atom and bond lines, and
    /// the end-of-molecule marker
    pub fn to_sdf(&self) -> String {
        let mut out = String::from("A\nA\nA\n");
        for line in self.atom_lines.iter().chain(&self.bond_lines) {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("M  END");
        out
    }
}

/// the scan angles we expect to see: multiples of 10 degrees in [-360, 360]
pub fn is_canonical_angle(angle: f64) -> bool {
    (-360.0..=360.0).contains(&angle) && angle % 10.0 == 0.0
}

/// the parsed records of one input file, plus what was dropped getting them
#[derive(Debug, Default)]
pub struct SdfFile {
    pub records: Vec<MoleculeRecord>,
    pub stats: ParseStats,
}

pub fn read_sdf(path: impl AsRef<Path>, mode: ParseMode) -> Result<SdfFile, Error> {
    parse_records(&read_to_string(path)?, mode)
}

/// split `contents` into `$$$$`-terminated blocks and parse each into a
/// [MoleculeRecord]
pub fn parse_records(contents: &str, mode: ParseMode) -> Result<SdfFile, Error> {
    let mut stats = ParseStats::default();

    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut expecting_name = true;
    for line in contents.lines() {
        if expecting_name {
            current.push(line.trim());
            expecting_name = false;
        } else if line.starts_with("$$$$") {
            blocks.push(std::mem::take(&mut current));
            expecting_name = true;
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        let name = current[0].to_owned();
        match mode {
            ParseMode::Strict => return Err(Error::UnterminatedBlock { name }),
            ParseMode::Lenient => {
                warn!("dropping unterminated trailing block starting at '{name}'");
                stats.unterminated_block = true;
            }
        }
    }

    let mut records = Vec::with_capacity(blocks.len());
    for block in blocks {
        records.push(parse_block(&block, mode, &mut stats)?);
    }

    Ok(SdfFile { records, stats })
}

/// parse one raw block. lines 0-2 are positional; a later line starting with
/// `>` names a property whose value is the following line; every other line
/// is classified by length
fn parse_block(
    lines: &[&str],
    mode: ParseMode,
    stats: &mut ParseStats,
) -> Result<MoleculeRecord, Error> {
    let mut rec = MoleculeRecord {
        name: lines.first().copied().unwrap_or_default().to_owned(),
        id: lines.get(1).copied().unwrap_or_default().to_owned(),
        software: lines.get(2).copied().unwrap_or_default().to_owned(),
        ..Default::default()
    };

    for (i, line) in lines.iter().enumerate().skip(3) {
        if line.starts_with('>') {
            // the property name is the last token with the angle brackets
            // stripped, as in `>  <SMILES>`
            let key = line
                .split_whitespace()
                .last()
                .unwrap_or_default()
                .replace(['<', '>'], "");
            match lines.get(i + 1) {
                Some(value) => {
                    rec.properties.insert(key, value.trim().to_owned());
                }
                None => warn!(
                    "property tag '{key}' at the end of record '{}' has no value",
                    rec.name
                ),
            }
        } else if ATOM_LINE_LENGTHS.contains(&line.len()) {
            rec.atom_lines.push((*line).to_owned());
        } else if line.len() == BOND_LINE_LENGTH {
            rec.bond_lines.push((*line).to_owned());
        } else if !lines[i - 1].starts_with('>') {
            // not a property value either, so nothing claims this line
            match mode {
                ParseMode::Strict => {
                    return Err(Error::UnrecognizedLine {
                        name: rec.name,
                        lineno: i,
                        line: (*line).to_owned(),
                    })
                }
                ParseMode::Lenient => {
                    debug!(
                        "dropping {}-byte line {i} in record '{}': {line:?}",
                        line.len(),
                        rec.name
                    );
                    stats.skipped_lines += 1;
                }
            }
        }
    }

    Ok(rec)
}
