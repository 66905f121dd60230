use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use stv_voting::*;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::stv::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_text;

#[derive(Debug, Snafu)]
pub enum StvError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive integer"))]
    ParsingJsonNumber {},
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Missing worksheet {name}"))]
    EmptyExcel { name: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("CSV line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Invalid count on line {lineno}"))]
    InvalidCount { lineno: usize },
    #[snafu(display("Malformed settings file {path}, line {lineno}"))]
    MalformedSettings { path: String, lineno: usize },
    #[snafu(display("Error while counting the votes: {source}"))]
    Voting { source: VotingErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type StvResult<T> = Result<T, StvError>;

/// A ballot, as parsed by the readers.
/// The choices are the raw labels, blanks included.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: Option<String>,
    pub count: Option<u64>,
    pub choices: Vec<String>,
}

const RUNOFF_NOTICE: &str = "There is an unbreakable tie, a runoff must be called to break it.";

fn ordinal_suffix(n: u32) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn format_ordinal(n: u32) -> String {
    format!("{}{}", n, ordinal_suffix(n))
}

/// The human readable list of winners.
fn winners_report(rv: &ElectionResult) -> String {
    let mut report = String::new();
    if rv.needs_runoff {
        report.push_str(RUNOFF_NOTICE);
        report.push_str("\n\n");
    }
    for (ordinal, slot) in rv.seats.iter() {
        report.push_str(&format!("{} seat: {}\n", format_ordinal(*ordinal), slot));
    }
    report
}

fn transfers_to_json(ts: &TransferStats) -> JSMap<String, JSValue> {
    let mut transfers: JSMap<String, JSValue> = JSMap::new();
    for (name, count) in ts.transfers.iter() {
        transfers.insert(name.clone(), json!(count.to_string()));
    }
    if ts.exhausted > 0 {
        transfers.insert("exhausted".to_string(), json!(ts.exhausted.to_string()));
    }
    transfers
}

fn result_stats_to_json(rs: &ElectionResult) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round_stat in rs.round_stats.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (name, count) in round_stat.tally.iter() {
            tally.insert(name.clone(), json!(count.to_string()));
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        for elim_stats in round_stat.tally_result_eliminated.iter() {
            tally_results.push(json!({
                "eliminated": elim_stats.name,
                "transfers": transfers_to_json(elim_stats)
            }));
        }
        for elect_stats in round_stat.tally_results_elected.iter() {
            tally_results.push(json!({
                "elected": elect_stats.name,
                "transfers": transfers_to_json(elect_stats)
            }));
        }

        let js = json!({"round": round_stat.round, "tally": tally, "tallyResults": tally_results});
        l.push(js);
    }
    l
}

fn winners_to_json(rs: &ElectionResult) -> Vec<JSValue> {
    rs.seats
        .iter()
        .map(|(ordinal, slot)| json!({"seat": format_ordinal(*ordinal), "winner": slot.name()}))
        .collect()
}

fn build_summary_js(config: &StvConfig, rules: &VoteRules, rv: &ElectionResult) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_juridiction.clone(),
        office: config.output_settings.contest_office.clone(),
        threshold: Some(rv.quota.to_string()),
        number_of_winners: Some(rules.number_of_winners.to_string()),
    };
    json!({
        "config": c,
        "results": result_stats_to_json(rv),
        "winners": winners_to_json(rv),
        "needsRunoff": rv.needs_runoff
    })
}

fn read_ranking_data(cfs: &FileSource) -> StvResult<Vec<ParsedBallot>> {
    info!("Attempting to read rank file {:?}", cfs.file_path);
    match cfs.provider.as_str() {
        "text" => io_text::read_text_ballots(&cfs.file_path),
        "csv" => io_csv::read_csv_ranking(&cfs.file_path, cfs),
        "xlsx" => io_excel::read_excel_file(&cfs.file_path, cfs),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

/// The names of the candidates taking part in the count, in order.
fn validate_candidates(candidates: &[StvCandidate]) -> StvResult<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    for (idx, c) in candidates.iter().enumerate() {
        if c.name.trim().is_empty() {
            whatever!("Candidate #{} has an empty name", idx + 1);
        }
        if candidates[..idx].iter().any(|c2| c2.name == c.name) {
            whatever!("Candidate {} is listed more than once", c.name);
        }
        if let Some(code) = c.code.as_deref().filter(|code| !code.is_empty()) {
            let clash = candidates.iter().enumerate().find(|(idx2, c2)| {
                *idx2 != idx && (c2.name == code || c2.code.as_deref() == Some(code))
            });
            if let Some((_, c2)) = clash {
                whatever!(
                    "The code {} of candidate {} is also used by candidate {}",
                    code,
                    c.name,
                    c2.name
                );
            }
        }
        if c.excluded.unwrap_or(false) {
            info!("Candidate {} is excluded from the count", c.name);
        } else {
            names.push(c.name.clone());
        }
    }
    Ok(names)
}

/// Turns the labels of the ballots into candidate names.
///
/// A label is either the name or the code of a candidate. Blank labels are
/// skipped, as are excluded candidates. Anything else is dropped with a
/// warning. Ballots left empty still take part in the count.
fn validate_ballots(parsed_ballots: &[ParsedBallot], candidates: &[StvCandidate]) -> Vec<Vote> {
    let mut labels: HashMap<&str, &StvCandidate> = HashMap::new();
    for c in candidates.iter() {
        labels.insert(c.name.as_str(), c);
        if let Some(code) = c.code.as_deref().filter(|code| !code.is_empty()) {
            labels.insert(code, c);
        }
    }

    let mut res: Vec<Vote> = Vec::new();
    for pb in parsed_ballots.iter() {
        let mut names: Vec<String> = Vec::new();
        for s in pb.choices.iter() {
            match s.trim() {
                "" => {}
                label => match labels.get(label) {
                    Some(c) if c.excluded.unwrap_or(false) => {
                        debug!("ballot {:?}: skipping excluded candidate {}", pb.id, c.name);
                    }
                    Some(c) => names.push(c.name.clone()),
                    None => {
                        warn!(
                            "ballot {:?}: candidate {} does not exist, they were not added to the ballot",
                            pb.id, label
                        );
                    }
                },
            }
        }
        debug!("Choices for ballot {:?}: {:?}", pb.id, names);

        // Default of 1 if not specified
        let count = pb.count.unwrap_or(1);
        if count > 0 {
            res.push(Vote {
                candidates: names,
                count,
            });
        }
    }
    res
}

fn validate_rules(rules: &StvRules) -> StvResult<VoteRules> {
    let number_of_winners = match &rules.number_of_winners {
        None | Some(JSValue::Null) => 1,
        x => read_js_int(x)?,
    };
    if number_of_winners == 0 {
        whatever!("numberOfWinners must be at least 1");
    }
    let number_of_winners = match u32::try_from(number_of_winners) {
        Ok(n) => n,
        Err(_) => whatever!("numberOfWinners is too large: {}", number_of_winners),
    };
    Ok(VoteRules { number_of_winners })
}

fn write_output(dest: &str, contents: &str) -> StvResult<()> {
    if dest == "stdout" {
        print!("{}", contents);
        Ok(())
    } else {
        info!("Writing {}", dest);
        fs::write(dest, contents).context(WritingFileSnafu { path: dest })
    }
}

fn check_reference(summary_path: String, pretty_js_stats: &str) -> StvResult<()> {
    let summary_ref = read_summary(summary_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

/// Counts an election whose file paths are already resolved.
pub fn run_election_config(
    config: &StvConfig,
    out: Option<String>,
    check_summary_path: Option<String>,
) -> StvResult<ElectionResult> {
    let rules = validate_rules(&config.rules)?;
    let candidates = validate_candidates(&config.candidates)?;

    if config.cvr_file_sources.is_empty() {
        whatever!("No file sources detected");
    }

    let mut data: Vec<Vote> = Vec::new();
    for cfs in config.cvr_file_sources.iter() {
        let parsed = read_ranking_data(cfs)?;
        let mut file_data = validate_ballots(&parsed, &config.candidates);
        info!("Read {} ballots from {}", file_data.len(), cfs.file_path);
        data.append(&mut file_data);
    }
    debug!("data: {:?}", data);

    let result = stv_voting::run_election(&data, &rules, &candidates).context(VotingSnafu {})?;
    debug!("result: {:?}", result);

    let report = winners_report(&result);
    match &config.output_settings.winners_file {
        Some(path) => write_output(path, &report)?,
        None => write_output("stdout", &report)?,
    }

    let result_js = build_summary_js(config, &rules, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    if let Some(out_path) = out {
        write_output(&out_path, &format!("{}\n", pretty_js_stats))?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        check_reference(summary_p, &pretty_js_stats)?;
    }

    Ok(result)
}

const DEFAULT_SETTINGS_FILE: &str = "settings.txt";

fn config_from_settings(settings_path: &str) -> StvResult<StvConfig> {
    let settings = read_settings(settings_path)?;
    let candidates = io_text::read_text_candidates(&settings.candidates_file)?;
    Ok(StvConfig {
        output_settings: OutputSettings {
            winners_file: Some(settings.winners_file.clone()),
            ..OutputSettings::named(io_common::simplify_file_name(settings_path))
        },
        cvr_file_sources: vec![FileSource::new("text", &settings.ballots_file)],
        candidates: candidates.iter().map(|n| StvCandidate::named(n)).collect(),
        rules: StvRules {
            number_of_winners: Some(json!(settings.seats)),
            rules_description: None,
        },
    })
}

/// Applies the command line options on top of a configuration.
fn apply_args(config: &mut StvConfig, args: &Args) {
    if let Some(input) = &args.input {
        let provider = args.input_type.clone().unwrap_or_else(|| "text".to_string());
        let mut cfs = FileSource::new(&provider, input);
        cfs.excel_worksheet_name = args.excel_worksheet_name.clone();
        config.cvr_file_sources = vec![cfs];
    } else if let Some(name) = &args.excel_worksheet_name {
        for cfs in config.cvr_file_sources.iter_mut() {
            cfs.excel_worksheet_name = Some(name.clone());
        }
    }
    if let Some(cands) = &args.candidates {
        config.candidates = cands.iter().map(|n| StvCandidate::named(n.trim())).collect();
    }
    if let Some(seats) = args.seats {
        config.rules.number_of_winners = Some(json!(seats));
    }
}

/// The settings file picked up from `dir` when no other source is given.
fn default_settings_path(dir: &Path) -> Option<String> {
    let path = dir.join(DEFAULT_SETTINGS_FILE);
    if path.is_file() {
        Some(path.display().to_string())
    } else {
        None
    }
}

/// Runs the program from the command line options.
pub fn run_cli(args: &Args) -> StvResult<ElectionResult> {
    let mut config = if let Some(config_path) = &args.config {
        read_config(config_path)?
    } else if let Some(settings_path) = &args.settings {
        config_from_settings(settings_path)?
    } else if let Some(input) = &args.input {
        if args.candidates.is_none() {
            whatever!("The --candidates option is required when no configuration is given");
        }
        StvConfig {
            output_settings: OutputSettings::named(io_common::simplify_file_name(input)),
            cvr_file_sources: Vec::new(),
            candidates: Vec::new(),
            rules: StvRules {
                number_of_winners: None,
                rules_description: None,
            },
        }
    } else if let Some(settings_path) = default_settings_path(Path::new(".")) {
        info!("Using the settings file {}", settings_path);
        config_from_settings(&settings_path)?
    } else {
        whatever!("One of --config, --settings or --input must be provided");
    };
    apply_args(&mut config, args);
    run_election_config(&config, args.out.clone(), args.reference.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::{Path, PathBuf};

    fn test_dir() -> PathBuf {
        match option_env!("STV_TEST_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data"),
        }
    }

    fn run_election_test(test_name: &str, config_lpath: &str, summary_lpath: &str) {
        let dir = test_dir().join(test_name);
        info!("Running test {}", test_name);
        let res = read_config(&dir.join(config_lpath).display().to_string()).and_then(|config| {
            run_election_config(
                &config,
                None,
                Some(dir.join(summary_lpath).display().to_string()),
            )
        });
        if let Err(e) = &res {
            eprintln!("An error occured {}", e);
            if let Some(bt) = snafu::ErrorCompat::backtrace(e) {
                eprintln!("trace: {}", bt);
            }
        }
        assert!(res.is_ok(), "test {} failed", test_name);
    }

    fn test_wrapper(test_name: &str) {
        run_election_test(
            test_name,
            format!("{}_config.json", test_name).as_str(),
            format!("{}_expected_summary.json", test_name).as_str(),
        )
    }

    fn ballot(choices: &[&str], count: Option<u64>) -> ParsedBallot {
        ParsedBallot {
            id: None,
            count,
            choices: choices.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn result(seats: Vec<WinnerSlot>, needs_runoff: bool) -> ElectionResult {
        ElectionResult {
            quota: 1,
            seats: seats
                .into_iter()
                .enumerate()
                .map(|(idx, s)| (idx as u32 + 1, s))
                .collect(),
            needs_runoff,
            round_stats: Vec::new(),
        }
    }

    #[test]
    fn ordinals() {
        let got: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 23, 101, 111]
            .iter()
            .map(|n| format_ordinal(*n))
            .collect();
        assert_eq!(
            got,
            vec![
                "1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "23rd",
                "101st", "111th"
            ]
        );
    }

    #[test]
    fn report_lists_seats() {
        let rv = result(
            vec![WinnerSlot::Seated("Alice".to_string()), WinnerSlot::Vacant],
            false,
        );
        assert_eq!(winners_report(&rv), "1st seat: Alice\n2nd seat: Vacant\n");
    }

    #[test]
    fn report_announces_runoff() {
        let rv = result(
            vec![WinnerSlot::Seated("Alice".to_string()), WinnerSlot::Tied],
            true,
        );
        assert_eq!(
            winners_report(&rv),
            format!("{}\n\n1st seat: Alice\n2nd seat: Tied\n", RUNOFF_NOTICE)
        );
    }

    #[test]
    fn ballots_keep_known_names_only() {
        let mut excluded = StvCandidate::named("C");
        excluded.excluded = Some(true);
        let mut coded = StvCandidate::named("Bob");
        coded.code = Some("B".to_string());
        let candidates = vec![StvCandidate::named("A"), coded, excluded];

        let votes = validate_ballots(
            &[
                ballot(&[" A ", "", "X", "B"], None),
                ballot(&["C", "Bob"], Some(3)),
                ballot(&["", ""], None),
                ballot(&["A"], Some(0)),
            ],
            &candidates,
        );
        assert_eq!(
            votes,
            vec![
                Vote {
                    candidates: vec!["A".to_string(), "Bob".to_string()],
                    count: 1
                },
                Vote {
                    candidates: vec!["Bob".to_string()],
                    count: 3
                },
                Vote {
                    candidates: vec![],
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn candidates_are_checked() {
        let mut excluded = StvCandidate::named("B");
        excluded.excluded = Some(true);
        let names =
            validate_candidates(&[StvCandidate::named("A"), excluded, StvCandidate::named("C")])
                .unwrap();
        assert_eq!(names, vec!["A".to_string(), "C".to_string()]);

        assert!(validate_candidates(&[StvCandidate::named("A"), StvCandidate::named("A")]).is_err());
        assert!(validate_candidates(&[StvCandidate::named(" ")]).is_err());
    }

    #[test]
    fn codes_cannot_shadow_other_candidates() {
        let coded = |name: &str, code: &str| {
            let mut c = StvCandidate::named(name);
            c.code = Some(code.to_string());
            c
        };

        // A code naming another candidate would send that candidate's votes elsewhere.
        let res = validate_candidates(&[StvCandidate::named("Alice"), coded("Bob", "Alice")]);
        assert!(matches!(res, Err(StvError::Whatever { .. })));
        assert!(validate_candidates(&[coded("Bob", "Alice"), StvCandidate::named("Alice")]).is_err());
        assert!(validate_candidates(&[coded("Alice", "X"), coded("Bob", "X")]).is_err());

        let mut excluded = coded("Clara", "Alice");
        excluded.excluded = Some(true);
        assert!(validate_candidates(&[StvCandidate::named("Alice"), excluded]).is_err());

        let names = validate_candidates(&[coded("Alice", "Alice"), coded("Bob", "")]).unwrap();
        assert_eq!(names, vec!["Alice".to_string(), "Bob".to_string()]);
        let candidates = vec![coded("Alice", "A1"), coded("Bob", "B1")];
        validate_candidates(&candidates).unwrap();
        let votes = validate_ballots(&[ballot(&["Alice", "B1"], None)], &candidates);
        assert_eq!(
            votes,
            vec![Vote {
                candidates: vec!["Alice".to_string(), "Bob".to_string()],
                count: 1
            }]
        );
    }

    #[test]
    fn rules_are_checked() {
        let rules = |x: Option<JSValue>| StvRules {
            number_of_winners: x,
            rules_description: None,
        };
        assert_eq!(validate_rules(&rules(None)).unwrap().number_of_winners, 1);
        assert_eq!(
            validate_rules(&rules(Some(json!("3"))))
                .unwrap()
                .number_of_winners,
            3
        );
        assert!(validate_rules(&rules(Some(json!(0)))).is_err());
        assert!(validate_rules(&rules(Some(json!("two")))).is_err());
    }

    #[test]
    fn legacy_settings() {
        let data = test_dir().join("legacy_settings");
        let out_dir = std::env::temp_dir().join(format!("stvtab-settings-{}", std::process::id()));
        fs::create_dir_all(&out_dir).unwrap();
        let winners = out_dir.join("winners.txt");
        let settings_path = out_dir.join("settings.txt");
        fs::write(
            &settings_path,
            format!(
                "seats = 2\ncandidates = {}\nballots = {}\nwinners = {}\n",
                data.join("candidates.txt").display(),
                data.join("ballots.txt").display(),
                winners.display()
            ),
        )
        .unwrap();

        let config = config_from_settings(&settings_path.display().to_string()).unwrap();
        let res = run_election_config(&config, None, None).unwrap();
        assert_eq!(res.quota, 3);
        let report = fs::read_to_string(&winners).unwrap();
        assert_eq!(report, "1st seat: Alice\n2nd seat: Bob\n");
        fs::remove_dir_all(&out_dir).unwrap();
    }

    #[test]
    fn settings_file_is_found_in_directory() {
        let dir = std::env::temp_dir().join(format!("stvtab-default-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        assert_eq!(default_settings_path(&dir), None);

        fs::create_dir_all(dir.join("settings.txt")).unwrap();
        assert_eq!(default_settings_path(&dir), None);
        fs::remove_dir(dir.join("settings.txt")).unwrap();

        let settings_path = dir.join("settings.txt");
        fs::write(&settings_path, "seats = 1\na = b\nc = d\ne = f\n").unwrap();
        let found = default_settings_path(&dir).unwrap();
        assert_eq!(found, settings_path.display().to_string());
        assert_eq!(read_settings(&found).unwrap().seats, 1);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn malformed_settings() {
        let out_dir = std::env::temp_dir().join(format!("stvtab-malformed-{}", std::process::id()));
        fs::create_dir_all(&out_dir).unwrap();
        let settings_path = out_dir.join("settings.txt");
        fs::write(&settings_path, "seats = two\na = b\nc = d\ne = f\n").unwrap();
        let res = read_settings(&settings_path.display().to_string());
        assert!(matches!(res, Err(StvError::MalformedSettings { lineno: 1, .. })));

        fs::write(&settings_path, "seats = 2\ncandidates.txt\n").unwrap();
        let res = read_settings(&settings_path.display().to_string());
        assert!(matches!(res, Err(StvError::MalformedSettings { lineno: 2, .. })));
        fs::remove_dir_all(&out_dir).unwrap();
    }

    #[test]
    fn three_candidates_one_seat() {
        test_wrapper("three_candidates_one_seat");
    }

    #[test]
    fn csv_two_seats_surplus() {
        test_wrapper("csv_two_seats_surplus");
    }

    #[test]
    fn excluded_candidate() {
        test_wrapper("excluded_candidate");
    }

    #[test]
    fn unbreakable_tie() {
        test_wrapper("unbreakable_tie");
    }
}
