// Plain text ballots: an instruction line, then one ballot per line.

use crate::stv::{io_common::make_default_id, *};

pub fn read_text_ballots(path: &str) -> StvResult<Vec<ParsedBallot>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let default_id = make_default_id(path);

    let mut res: Vec<ParsedBallot> = Vec::new();
    // The first line holds the instructions for the voters.
    for (idx, line) in contents.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let lineno = idx + 1;
        let choices = split_names(line);
        debug!("read_text_ballots: lineno: {:?} row: {:?}", lineno, &choices);
        res.push(ParsedBallot {
            id: Some(default_id(lineno)),
            count: None,
            choices,
        });
    }
    Ok(res)
}

/// The candidates file has the same layout as the ballots file. All the names
/// after the instruction line are read, in order.
pub fn read_text_candidates(path: &str) -> StvResult<Vec<String>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let names: Vec<String> = contents
        .lines()
        .skip(1)
        .flat_map(split_names)
        .filter(|n| !n.is_empty())
        .collect();
    debug!("read_text_candidates: {:?}", names);
    Ok(names)
}

fn split_names(line: &str) -> Vec<String> {
    line.split(',').map(|s| s.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tmp(name: &str, contents: &str) -> String {
        let p = std::env::temp_dir().join(format!("stvtab-{}-{}", std::process::id(), name));
        fs::write(&p, contents).unwrap();
        p.display().to_string()
    }

    #[test]
    fn reads_ballots_after_instructions() {
        let path = write_tmp(
            "ballots.txt",
            "Rank the candidates\nAlice, Bob\n\n  Clara ,, Alice\n",
        );
        let ballots = read_text_ballots(&path).unwrap();
        assert_eq!(ballots.len(), 2);
        assert_eq!(ballots[0].choices, vec!["Alice", "Bob"]);
        assert_eq!(ballots[1].choices, vec!["Clara", "", "Alice"]);
        assert_eq!(ballots[0].count, None);
        assert!(ballots[1].id.as_ref().unwrap().ends_with("-00000004"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn reads_candidates() {
        let path = write_tmp("candidates.txt", "Candidates\nAlice, Bob\nClara\n");
        assert_eq!(
            read_text_candidates(&path).unwrap(),
            vec!["Alice", "Bob", "Clara"]
        );
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file() {
        let res = read_text_ballots("/nonexistent/ballots.txt");
        assert!(matches!(res, Err(StvError::OpeningFile { .. })));
    }
}
