// Primitives for reading CSV files.

use std::fs::File;

use crate::tally::{io_common::make_default_id, *};

pub fn read_csv_ranking(path: &str, cfs: &FileSource) -> CliResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);

    let id_idx_o = cfs.id_column_index_int()?;
    let choices_start_col = cfs.first_vote_column_index()?;
    let count_idx_o = cfs.count_column_index_int()?;

    let mut res: Vec<ParsedBallot> = Vec::new();
    let (records, first_row) = get_records(path, cfs)?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + first_row;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let id = if let Some(id_idx) = id_idx_o {
            line.get(id_idx)
                .context(CsvLineTooShortSnafu { lineno })?
                .to_string()
        } else {
            default_id(lineno)
        };

        let count: Option<u64> = if let Some(count_idx) = count_idx_o {
            let s = line
                .get(count_idx)
                .context(CsvLineTooShortSnafu { lineno })?;
            Some(s.parse::<u64>().ok().context(CsvCountSnafu {
                lineno,
                content: s.to_string(),
            })?)
        } else {
            None
        };

        // Empty cells are unfilled ranks.
        let choices: Vec<String> = line
            .iter()
            .enumerate()
            .skip(choices_start_col)
            .filter(|(col, _)| Some(*col) != id_idx_o && Some(*col) != count_idx_o)
            .map(|(_, s)| s.to_string())
            .filter(|s| !s.is_empty())
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
) -> CliResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = cfs.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();
    // The index starts at 1 to respect most conventions in the excel world
    for _ in 1..first_row {
        _ = records.next();
    }
    Ok((records, first_row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(name: &str, content: &str) -> String {
        let p = std::env::temp_dir().join(format!("tally_io_csv_{}_{}.csv", std::process::id(), name));
        fs::write(&p, content).unwrap();
        p.display().to_string()
    }

    fn with_columns(path: &str, id: u64, count: u64, first_vote: u64) -> FileSource {
        serde_json::from_value(serde_json::json!({
            "provider": "csv",
            "filePath": path,
            "idColumnIndex": id,
            "countColumnIndex": count,
            "firstVoteColumnIndex": first_vote
        }))
        .unwrap()
    }

    #[test]
    fn reads_ids_counts_and_choices() {
        let path = write_csv("ok", "b1,3,Alice,,Bob\nb2,1,Carol\n");
        let res = read_csv_ranking(&path, &with_columns(&path, 1, 2, 3)).unwrap();
        assert_eq!(
            res,
            vec![
                ParsedBallot {
                    id: Some("b1".to_string()),
                    count: Some(3),
                    choices: vec!["Alice".to_string(), "Bob".to_string()],
                },
                ParsedBallot {
                    id: Some("b2".to_string()),
                    count: Some(1),
                    choices: vec!["Carol".to_string()],
                },
            ]
        );
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn short_line() {
        let path = write_csv("short", "b1,2,Alice\nb2\n");
        let res = read_csv_ranking(&path, &with_columns(&path, 1, 2, 3));
        assert!(matches!(res, Err(CliError::CsvLineTooShort { lineno: 2 })));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn count_is_not_a_number() {
        let path = write_csv("count", "b1,two,Alice\n");
        match read_csv_ranking(&path, &with_columns(&path, 1, 2, 3)) {
            Err(CliError::CsvCount { lineno, content }) => {
                assert_eq!(lineno, 1);
                assert_eq!(content, "two");
            }
            x => panic!("unexpected result: {:?}", x.map(|v| v.len())),
        }
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file() {
        let source = FileSource::from_path("/nonexistent/ballots.csv");
        let res = read_csv_ranking("/nonexistent/ballots.csv", &source);
        assert!(matches!(res, Err(CliError::CsvOpen { .. })));
    }
}
