// Excel workbooks. The first row of the worksheet is a header.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::stv::{io_common::make_default_id, *};

pub fn read_excel_file(path: &str, cfs: &FileSource) -> StvResult<Vec<ParsedBallot>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match &cfs.excel_worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(EmptyExcelSnafu { name: name.as_str() })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { name: "#1" })?,
    }
    .context(OpeningExcelSnafu { path })?;

    let start_range = cfs.first_vote_column_index()?;
    let id_idx_o = cfs.id_column_index_int()?;
    let count_idx_o = cfs.count_column_index_int()?;
    let default_id = make_default_id(path);

    let mut iter = wrange.rows();
    if let Some(header) = iter.next() {
        debug!("header: {:?}", header);
    }

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        debug!("workbook: {:?}", row);
        let mut choices: Vec<String> = Vec::new();
        for elt in row.iter().skip(start_range) {
            choices.push(read_choice_calamine(elt, lineno)?);
        }

        let count = read_count_calamine(count_idx_o.and_then(|i| row.get(i)), lineno)?;

        let id = match id_idx_o.and_then(|i| row.get(i)) {
            Some(DataType::String(s)) => s.clone(),
            Some(DataType::Int(i)) => i.to_string(),
            Some(DataType::Float(f)) => f.to_string(),
            _ => default_id(lineno),
        };

        res.push(ParsedBallot {
            id: Some(id),
            count,
            choices,
        });
    }
    Ok(res)
}

/// Counts must be whole, non-negative numbers.
fn read_count_calamine(cell: Option<&DataType>, lineno: usize) -> StvResult<Option<u64>> {
    match cell {
        None | Some(DataType::Empty) => Ok(None),
        Some(DataType::Float(f)) if *f >= 0.0 && f.fract() == 0.0 => Ok(Some(*f as u64)),
        Some(DataType::Int(i)) if *i >= 0 => Ok(Some(*i as u64)),
        Some(DataType::String(s)) => Ok(Some(
            s.trim()
                .parse::<u64>()
                .ok()
                .context(InvalidCountSnafu { lineno })?,
        )),
        Some(_) => InvalidCountSnafu { lineno }.fail(),
    }
}

fn read_choice_calamine(cell: &DataType, lineno: usize) -> StvResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Empty => Ok("".to_string()),
        _ => whatever!(
            "read_choice_calamine: row {}: could not understand cell {:?}",
            lineno,
            cell
        ),
    }
}
