// Primitives for reading CSV files.

use std::fs::File;

use crate::stv::{io_common::make_default_id, *};

pub fn read_csv_ranking(path: &str, cfs: &FileSource) -> StvResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);

    let id_idx_o = cfs.id_column_index_int()?;
    let choices_start_col = cfs.first_vote_column_index()?;
    let count_idx_o = cfs.count_column_index_int()?;

    let mut res: Vec<ParsedBallot> = Vec::new();
    let (records, row_offset) = get_records(path, cfs)?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset + 1;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let id = if let Some(id_idx) = id_idx_o {
            line.get(id_idx)
                .context(CsvLineTooShortSnafu { lineno })?
                .to_string()
        } else {
            default_id(lineno)
        };

        let count: Option<u64> = if let Some(count_idx) = count_idx_o {
            let count = line
                .get(count_idx)
                .context(CsvLineTooShortSnafu { lineno })?
                .trim()
                .parse::<u64>()
                .ok()
                .context(InvalidCountSnafu { lineno })?;
            Some(count)
        } else {
            None
        };

        let choices: Vec<String> = line
            .iter()
            .skip(choices_start_col)
            .map(|s| s.to_string())
            .collect();
        debug!("read_csv_ranking: lineno: {:?} row: {:?}", lineno, &choices);

        res.push(ParsedBallot {
            id: Some(id),
            count,
            choices,
        });
    }
    Ok(res)
}

fn get_records(
    path: &str,
    cfs: &FileSource,
) -> StvResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = cfs.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();
    for _ in 0..first_row {
        let _ = records.next();
    }
    Ok((records, first_row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_tmp(name: &str, contents: &str) -> String {
        let p = std::env::temp_dir().join(format!("stvtab-{}-{}", std::process::id(), name));
        fs::write(&p, contents).unwrap();
        p.display().to_string()
    }

    fn source(path: &str, js: JSValue) -> FileSource {
        let mut js = js;
        js["provider"] = json!("csv");
        js["filePath"] = json!(path);
        serde_json::from_value(js).unwrap()
    }

    #[test]
    fn reads_ids_counts_and_ragged_rows() {
        let path = write_tmp(
            "ids.csv",
            "id,count,choice 1,choice 2\nb1,20,A,B\nb2,3,C\n",
        );
        let cfs = source(
            &path,
            json!({"idColumnIndex": 1, "countColumnIndex": 2,
                   "firstVoteColumnIndex": 3, "firstVoteRowIndex": 2}),
        );
        let ballots = read_csv_ranking(&path, &cfs).unwrap();
        assert_eq!(
            ballots,
            vec![
                ParsedBallot {
                    id: Some("b1".to_string()),
                    count: Some(20),
                    choices: vec!["A".to_string(), "B".to_string()],
                },
                ParsedBallot {
                    id: Some("b2".to_string()),
                    count: Some(3),
                    choices: vec!["C".to_string()],
                },
            ]
        );
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn defaults_read_every_column() {
        let path = write_tmp("plain.csv", "A,,B\nC\n");
        let cfs = source(&path, json!({}));
        let ballots = read_csv_ranking(&path, &cfs).unwrap();
        assert_eq!(ballots.len(), 2);
        assert_eq!(ballots[0].choices, vec!["A", "", "B"]);
        assert_eq!(ballots[0].count, None);
        assert!(ballots[1].id.as_ref().unwrap().ends_with("-00000002"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn bad_count() {
        let path = write_tmp("badcount.csv", "x,A\n");
        let cfs = source(&path, json!({"countColumnIndex": 1, "firstVoteColumnIndex": 2}));
        let res = read_csv_ranking(&path, &cfs);
        assert!(matches!(res, Err(StvError::InvalidCount { lineno: 1 })));
        fs::remove_file(&path).unwrap();
    }
}
