//! group parsed records by SMILES and tabulate their scan angles

use std::path::Path;

use log::warn;

use crate::{
    sdf::{is_canonical_angle, MoleculeRecord},
    Error,
};

/// one summary line: how many conformers a molecule has and at how many
/// distinct torsion angles they were sampled
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryRow {
    pub smiles: String,
    pub record_count: usize,
    pub distinct_angle_count: usize,
}

/// partition `records` by exact SMILES equality: a stable sort on the key
/// followed by merging adjacent equal keys, so members keep their input
/// order within a group. a record without a SMILES aborts the run
pub fn group_by_smiles(
    records: &[MoleculeRecord],
) -> Result<Vec<(String, Vec<&MoleculeRecord>)>, Error> {
    let mut keyed = Vec::with_capacity(records.len());
    for rec in records {
        keyed.push((rec.smiles()?, rec));
    }
    keyed.sort_by(|a, b| a.0.cmp(b.0));

    let mut groups: Vec<(String, Vec<&MoleculeRecord>)> = Vec::new();
    for (smiles, rec) in keyed {
        let adjacent = matches!(groups.last(), Some((key, _)) if key == smiles);
        if !adjacent {
            groups.push((smiles.to_owned(), Vec::new()));
        }
        if let Some((_, members)) = groups.last_mut() {
            members.push(rec);
        }
    }
    Ok(groups)
}

/// tabulate each group. angle equality is exact bit equality after the
/// parse, with no tolerance banding
pub fn summarize(
    groups: &[(String, Vec<&MoleculeRecord>)],
) -> Result<Vec<SummaryRow>, Error> {
    let mut rows = Vec::with_capacity(groups.len());
    for (smiles, members) in groups {
        let mut angles = Vec::with_capacity(members.len());
        for rec in members {
            let angle = rec.scan_angle()?;
            if !is_canonical_angle(angle) {
                warn!(
                    "non-canonical scan angle {angle} in record '{}' ({smiles})",
                    rec.name
                );
            }
            angles.push(angle);
        }
        angles.sort_by(f64::total_cmp);
        angles.dedup_by(|a, b| a.to_bits() == b.to_bits());
        rows.push(SummaryRow {
            smiles: smiles.clone(),
            record_count: members.len(),
            distinct_angle_count: angles.len(),
        });
    }
    Ok(rows)
}

/// write `smiles,record_count,distinct_angle_count` rows sorted by
/// descending record count, with no header, truncating any existing file.
/// ties keep the order `rows` came in
pub fn write_summary(path: impl AsRef<Path>, rows: &[SummaryRow]) -> Result<(), Error> {
    let mut rows = rows.to_vec();
    rows.sort_by(|a, b| b.record_count.cmp(&a.record_count));

    let mut wtr = csv::Writer::from_path(path)?;
    for row in &rows {
        let count = row.record_count.to_string();
        let distinct = row.distinct_angle_count.to_string();
        wtr.write_record([row.smiles.as_str(), count.as_str(), distinct.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, fs::read_to_string};

    use super::*;

    fn record(smiles: &str, angle: &str) -> MoleculeRecord {
        MoleculeRecord {
            name: format!("{smiles} at {angle}"),
            properties: HashMap::from([
                ("SMILES".to_owned(), smiles.to_owned()),
                ("ScanVar_1".to_owned(), angle.to_owned()),
            ]),
            ..Default::default()
        }
    }

    fn row(smiles: &str, record_count: usize, distinct_angle_count: usize) -> SummaryRow {
        SummaryRow {
            smiles: smiles.to_owned(),
            record_count,
            distinct_angle_count,
        }
    }

    #[test]
    fn two_conformers_two_angles() {
        let records = [record("CCO", "0.0"), record("CCO", "10.0")];
        let groups = group_by_smiles(&records).unwrap();
        assert_eq!(summarize(&groups).unwrap(), [row("CCO", 2, 2)]);
    }

    #[test]
    fn repeated_angle_counts_once() {
        let records =
            [record("CCO", "0.0"), record("CCO", "0.0"), record("CCO", "0.0")];
        let groups = group_by_smiles(&records).unwrap();
        assert_eq!(summarize(&groups).unwrap(), [row("CCO", 3, 1)]);
    }

    #[test]
    fn groups_partition_the_records() {
        let records = [
            record("CCN", "0.0"),
            record("CCO", "10.0"),
            record("CCN", "-10.0"),
            record("C", "0.0"),
            record("CCN", "0.0"),
        ];
        let groups = group_by_smiles(&records).unwrap();
        let total: usize = groups.iter().map(|(_, members)| members.len()).sum();
        assert_eq!(total, records.len());

        // members keep input order within a group
        let ccn = &groups.iter().find(|(s, _)| s == "CCN").unwrap().1;
        let angles: Vec<_> =
            ccn.iter().map(|r| r.scan_angle().unwrap()).collect();
        assert_eq!(angles, [0.0, -10.0, 0.0]);

        for r in summarize(&groups).unwrap() {
            assert!(r.distinct_angle_count <= r.record_count);
        }
    }

    #[test]
    fn missing_smiles_aborts_grouping() {
        let records = [record("CCO", "0.0"), MoleculeRecord::default()];
        assert!(matches!(
            group_by_smiles(&records),
            Err(Error::MissingSmiles { .. })
        ));
    }

    #[test]
    fn bad_angle_aborts_summarizing() {
        let records = [record("CCO", "0.0"), record("CCO", "None")];
        let groups = group_by_smiles(&records).unwrap();
        assert!(matches!(
            summarize(&groups),
            Err(Error::BadAngle { value: Some(v), .. }) if v == "None"
        ));
    }

    #[test]
    fn summary_is_sorted_by_descending_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qm.csv");
        // X and Y tie, so they must keep this relative order
        let rows = [row("X", 2, 1), row("Y", 2, 2), row("Z", 5, 3)];
        write_summary(&path, &rows).unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "Z,5,3\nX,2,1\nY,2,2\n");
    }

    #[test]
    fn smiles_with_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qm.csv");
        write_summary(&path, &[row("C,C", 1, 1)]).unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "\"C,C\",1,1\n");
    }

    #[test]
    fn empty_input_writes_an_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qm.csv");
        write_summary(&path, &[]).unwrap();
        assert_eq!(read_to_string(&path).unwrap(), "");
    }
}
