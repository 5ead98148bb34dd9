//! Parsing of the machine's semicolon-separated CSV exports.
//!
//! The exports are messy: numeric columns may use `,` as the decimal
//! separator, individual lines can be truncated, and older files lack
//! the `V_Particule` and `Q_CG_PF2` columns. Bad lines are skipped
//! rather than failing the file; missing optional columns default to
//! `0.0`. The helium flow column (`Q_PG_He`) is not ingested.

use chrono::{NaiveDate, NaiveTime};
use remanet_core::telemetry::Reading;

/// Time-of-day format used in the `Time` column.
const TIME_FORMAT: &str = "%H:%M:%S";

/// Columns that must be present for a file to be ingestable.
const REQUIRED_COLUMNS: [&str; 4] = ["Time", "T_Gun", "P_Gun", "Q_PG_N2"];

/// Result of parsing one CSV file.
#[derive(Debug)]
pub struct ParsedCsv {
    /// Readings in file order.
    pub readings: Vec<Reading>,
    /// Number of data lines that could not be parsed.
    pub skipped: usize,
}

/// Why a file could not be parsed at all.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("file is empty")]
    Empty,
    #[error("required column {0:?} is missing from the header")]
    MissingColumn(&'static str),
}

/// Column indices resolved from the header line.
struct Header {
    time: usize,
    t_gun: usize,
    p_gun: usize,
    q_pg_n2: usize,
    v_particule: Option<usize>,
    q_cg_pf1: Option<usize>,
    q_cg_pf2: Option<usize>,
}

impl Header {
    fn parse(line: &str) -> Result<Self, ParseError> {
        let names: Vec<&str> = line.split(';').map(str::trim).collect();
        let index_of = |name: &str| names.iter().position(|n| *n == name);

        for required in REQUIRED_COLUMNS {
            if index_of(required).is_none() {
                return Err(ParseError::MissingColumn(required));
            }
        }

        Ok(Self {
            time: index_of("Time").expect("checked above"),
            t_gun: index_of("T_Gun").expect("checked above"),
            p_gun: index_of("P_Gun").expect("checked above"),
            q_pg_n2: index_of("Q_PG_N2").expect("checked above"),
            v_particule: index_of("V_Particule"),
            q_cg_pf1: index_of("Q_CG_PF1"),
            q_cg_pf2: index_of("Q_CG_PF2"),
        })
    }
}

/// Parse one CSV export, stamping each row with the folder date.
pub fn parse_cold_spray_csv(content: &str, date: NaiveDate) -> Result<ParsedCsv, ParseError> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let header = Header::parse(lines.next().ok_or(ParseError::Empty)?)?;

    let mut readings = Vec::new();
    let mut skipped = 0usize;

    for line in lines {
        match parse_line(line, &header, date) {
            Some(reading) => readings.push(reading),
            None => skipped += 1,
        }
    }

    Ok(ParsedCsv { readings, skipped })
}

/// Parse one data line; `None` skips the line.
fn parse_line(line: &str, header: &Header, date: NaiveDate) -> Option<Reading> {
    let fields: Vec<&str> = line.split(';').collect();

    let time_of_day =
        NaiveTime::parse_from_str(fields.get(header.time)?.trim(), TIME_FORMAT).ok()?;

    Some(Reading {
        time: date.and_time(time_of_day).and_utc(),
        t_gun: parse_number(fields.get(header.t_gun)?)?,
        p_gun: parse_number(fields.get(header.p_gun)?)?,
        q_pg_n2: parse_number(fields.get(header.q_pg_n2)?)?,
        v_particule: optional_number(&fields, header.v_particule),
        q_cg_pf1: optional_number(&fields, header.q_cg_pf1),
        q_cg_pf2: optional_number(&fields, header.q_cg_pf2),
    })
}

/// Parse a numeric field, accepting `,` as the decimal separator.
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse().ok()
}

/// Value of an optional column, defaulting to `0.0` when the column
/// or the value is absent.
fn optional_number(fields: &[&str], index: Option<usize>) -> f64 {
    index
        .and_then(|i| fields.get(i))
        .and_then(|raw| parse_number(raw))
        .unwrap_or(0.0)
}
