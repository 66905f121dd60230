use crate::stv::*;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_juridiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
    // New options specific to stvtab
    #[serde(rename = "winnersFile")]
    pub winners_file: Option<String>,
}

impl OutputSettings {
    pub fn named(contest_name: String) -> OutputSettings {
        OutputSettings {
            contest_name,
            output_directory: None,
            contest_date: None,
            contest_juridiction: None,
            contest_office: None,
            winners_file: None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    pub threshold: Option<String>,
    #[serde(rename = "numberOfWinners")]
    pub number_of_winners: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
    #[serde(rename = "countColumnIndex")]
    pub count_column_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl FileSource {
    pub fn new(provider: &str, file_path: &str) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            _first_vote_column_index: None,
            _first_vote_row_index: None,
            id_column_index: None,
            count_column_index: None,
            excel_worksheet_name: None,
        }
    }

    /// 0-based. The configuration counts from 1, and defaults to 1.
    pub fn first_vote_column_index(&self) -> StvResult<usize> {
        from_one_based(read_js_int_or(&self._first_vote_column_index, 1)?)
    }

    /// The number of rows to skip before the first ballot.
    pub fn first_vote_row_index(&self) -> StvResult<usize> {
        from_one_based(read_js_int_or(&self._first_vote_row_index, 1)?)
    }

    pub fn id_column_index_int(&self) -> StvResult<Option<usize>> {
        optional_column(&self.id_column_index)
    }

    pub fn count_column_index_int(&self) -> StvResult<Option<usize>> {
        optional_column(&self.count_column_index)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StvCandidate {
    pub name: String,
    pub code: Option<String>,
    pub excluded: Option<bool>,
}

impl StvCandidate {
    pub fn named(name: &str) -> StvCandidate {
        StvCandidate {
            name: name.to_string(),
            code: None,
            excluded: None,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StvRules {
    #[serde(rename = "numberOfWinners")]
    pub number_of_winners: Option<JSValue>,
    #[serde(rename = "rulesDescription")]
    pub rules_description: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StvConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "cvrFileSources")]
    pub cvr_file_sources: Vec<FileSource>,
    pub candidates: Vec<StvCandidate>,
    pub rules: StvRules,
}

/// Reads a JSON configuration. The paths it contains are made relative to the
/// directory of the configuration file.
pub fn read_config(path: &str) -> StvResult<StvConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let mut config: StvConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let root = Path::new(path).parent().context(MissingParentDirSnafu {})?;
    for cfs in config.cvr_file_sources.iter_mut() {
        cfs.file_path = join_path(root, &cfs.file_path);
    }
    if let Some(winners_file) = config.output_settings.winners_file.clone() {
        let out_dir: PathBuf = match &config.output_settings.output_directory {
            Some(dir) => root.join(dir),
            None => root.to_path_buf(),
        };
        config.output_settings.winners_file = Some(join_path(&out_dir, &winners_file));
    }
    debug!("read_config: {:?}", config);
    Ok(config)
}

fn join_path(root: &Path, rel: &str) -> String {
    root.join(rel).display().to_string()
}

/// The settings file of older installations.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LegacySettings {
    pub seats: u32,
    pub candidates_file: String,
    pub ballots_file: String,
    pub winners_file: String,
}

/// Reads four `name = value` lines, in this order: number of seats,
/// candidates file, ballots file, winners file. The names are not checked.
/// Relative paths are resolved from the directory of the settings file.
pub fn read_settings(path: &str) -> StvResult<LegacySettings> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let root = Path::new(path).parent().context(MissingParentDirSnafu {})?;

    let mut values: Vec<(usize, String)> = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let lineno = idx + 1;
        let (_, value) = line
            .split_once('=')
            .context(MalformedSettingsSnafu { path, lineno })?;
        values.push((lineno, value.trim().to_string()));
    }
    if values.len() < 4 {
        return MalformedSettingsSnafu {
            path,
            lineno: contents.lines().count() + 1,
        }
        .fail();
    }

    let (seats_lineno, seats_str) = &values[0];
    let seats = seats_str.parse::<u32>().ok().context(MalformedSettingsSnafu {
        path,
        lineno: *seats_lineno,
    })?;
    let settings = LegacySettings {
        seats,
        candidates_file: join_path(root, &values[1].1),
        ballots_file: join_path(root, &values[2].1),
        winners_file: join_path(root, &values[3].1),
    };
    debug!("read_settings: {:?}", settings);
    Ok(settings)
}

pub fn read_summary(path: String) -> StvResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

pub(crate) fn read_js_int(x: &Option<JSValue>) -> StvResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<usize>()
            .ok()
            .context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

fn read_js_int_or(x: &Option<JSValue>, default: usize) -> StvResult<usize> {
    match x {
        None | Some(JSValue::Null) => Ok(default),
        _ => read_js_int(x),
    }
}

fn from_one_based(x: usize) -> StvResult<usize> {
    x.checked_sub(1).context(ParsingJsonNumberSnafu {})
}

fn optional_column(x: &Option<JSValue>) -> StvResult<Option<usize>> {
    match x {
        None | Some(JSValue::Null) => Ok(None),
        _ => from_one_based(read_js_int(x)?).map(Some),
    }
}
