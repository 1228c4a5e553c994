use std::borrow::Cow;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::{Encoding, SHIFT_JIS, UTF_8};
use tracing::{debug, info, warn};

use crate::columns::{ColumnMap, Field};
use crate::error::{Error, Result};
use crate::metrics::{self, FuelParams};
use crate::types::TripRecord;
use crate::util::{parse_date_lenient, parse_distance, parse_minutes};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub accepted_rows: usize,
    /// Rows dropped because the driver cell was empty.
    pub rejected_rows: usize,
    /// Accepted rows whose distance could not be parsed.
    pub missing_distance: usize,
}

/// Read, decode and normalize a trip export from disk.
pub fn load_trips<P: AsRef<Path>>(
    path: P,
    encoding: &str,
    params: &FuelParams,
) -> Result<(Vec<TripRecord>, LoadReport)> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    info!(path = %path.display(), bytes = bytes.len(), "loading trip export");
    let text = decode(&bytes, encoding)?;
    normalize(text.as_bytes(), params)
}

/// Decode raw bytes to UTF-8.
///
/// `"auto"` keeps valid UTF-8 as-is and otherwise assumes CP932 (Shift_JIS),
/// which is what the on-board recorder software exports.
pub fn decode<'a>(bytes: &'a [u8], label: &str) -> Result<Cow<'a, str>> {
    let encoding: &'static Encoding = if label.eq_ignore_ascii_case("auto") {
        if std::str::from_utf8(bytes).is_ok() {
            UTF_8
        } else {
            SHIFT_JIS
        }
    } else if label.eq_ignore_ascii_case("cp932") {
        // not a WHATWG label, but what Windows tooling calls it
        SHIFT_JIS
    } else {
        Encoding::for_label(label.as_bytes())
            .ok_or_else(|| Error::UnknownEncoding(label.to_string()))?
    };

    // `decode` also strips a leading BOM.
    let (decoded, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(
            encoding = used.name(),
            "some characters could not be decoded and were replaced"
        );
    }
    debug!(encoding = used.name(), "decoded input");
    Ok(decoded)
}

/// Turn decoded CSV text into trip records with derived metrics.
///
/// Header problems abort the whole batch; problems in individual cells only
/// null out the affected fields.
pub fn normalize<R: std::io::Read>(
    reader: R,
    params: &FuelParams,
) -> Result<(Vec<TripRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(Error::EmptyInput);
    }
    let headers: Vec<&str> = headers.iter().collect();
    let columns = ColumnMap::resolve(&headers)?;
    for field in Field::ALL {
        match columns.index_of(field) {
            Some(i) => debug!(%field, column = headers[i], "resolved column"),
            None => debug!(%field, "column not present"),
        }
    }

    let mut report = LoadReport::default();
    let mut records = Vec::new();
    for (row_idx, result) in rdr.records().enumerate() {
        let row = result?;
        report.total_rows += 1;
        // +2: 0-based index plus the header line
        let line = row_idx + 2;

        let Some(mut record) = parse_row(&row, &columns) else {
            debug!(line, "row rejected: empty driver");
            report.rejected_rows += 1;
            continue;
        };
        if record.distance_km.is_none() {
            debug!(line, driver = %record.driver, "distance not parseable");
            report.missing_distance += 1;
        }
        metrics::derive(&mut record, params);
        records.push(record);
    }
    report.accepted_rows = records.len();

    info!(
        total = report.total_rows,
        accepted = report.accepted_rows,
        rejected = report.rejected_rows,
        missing_distance = report.missing_distance,
        "trip export normalized"
    );
    Ok((records, report))
}

fn parse_row(row: &StringRecord, columns: &ColumnMap) -> Option<TripRecord> {
    let cell = |index: Option<usize>| index.and_then(|i| row.get(i));

    let driver = row.get(columns.driver)?.trim();
    if driver.is_empty() {
        return None;
    }

    Some(TripRecord {
        driver: driver.to_string(),
        date: parse_date_lenient(cell(columns.date)),
        distance_km: parse_distance(row.get(columns.distance)),
        drive_minutes: parse_minutes(cell(columns.drive_time)),
        idle_minutes: parse_minutes(cell(columns.idle_time)),
        active_minutes: parse_minutes(cell(columns.active_time)),
        fuel_used_l: None,
        fuel_cost: None,
        idle_ratio_pct: None,
        avg_speed_kmh: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn params() -> FuelParams {
        FuelParams::new(160.0, 3.5).unwrap()
    }

    #[test]
    fn test_normalize_basic() {
        let csv = "乗務員,運行日,走行距離,ハンドル時間,アイドリング,稼働時間\n\
                   佐藤,2024/04/01,100km,2:00,0:30,4:00\n";
        let (records, report) = normalize(csv.as_bytes(), &params()).unwrap();
        assert_eq!(report.total_rows, 1);
        assert_eq!(report.accepted_rows, 1);
        let r = &records[0];
        assert_eq!(r.driver, "佐藤");
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 4, 1));
        assert_eq!(r.distance_km, Some(100.0));
        assert_eq!(r.fuel_used_l, Some(28.57));
        assert_eq!(r.fuel_cost, Some(4571));
        assert_eq!(r.idle_ratio_pct, Some(12.5));
        assert_eq!(r.avg_speed_kmh, Some(50.0));
    }

    #[test]
    fn test_row_level_failures_degrade_fields() {
        let csv = "乗務員,日付,一般・実車走行距離,ハンドル時間\n\
                   鈴木,不明,abc,x:y\n\
                   ,2024/04/01,10,1:00\n\
                   田中,2024-04-02,35,0:00\n";
        let (records, report) = normalize(csv.as_bytes(), &params()).unwrap();
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.rejected_rows, 1);
        assert_eq!(report.missing_distance, 1);
        assert_eq!(records.len(), 2);

        let suzuki = &records[0];
        assert_eq!(suzuki.date, None);
        assert_eq!(suzuki.distance_km, None);
        assert_eq!(suzuki.fuel_used_l, None);
        assert_eq!(suzuki.drive_minutes, None);

        let tanaka = &records[1];
        assert_eq!(tanaka.drive_minutes, Some(0.0));
        assert_eq!(tanaka.avg_speed_kmh, None);
        assert_eq!(tanaka.fuel_used_l, Some(10.0));
        assert_eq!(tanaka.idle_ratio_pct, None);
    }

    #[test]
    fn test_missing_required_column_aborts() {
        let csv = "乗務員,日付\n佐藤,2024/04/01\n";
        let err = normalize(csv.as_bytes(), &params()).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingRequiredColumn { field: Field::Distance, .. }
        ));
    }

    #[test]
    fn test_empty_input() {
        let err = normalize("".as_bytes(), &params()).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn test_decode_auto_shift_jis() {
        let (bytes, _, _) = SHIFT_JIS.encode("乗務員,走行距離\n");
        let text = decode(&bytes, "auto").unwrap();
        assert_eq!(text, "乗務員,走行距離\n");
    }

    #[test]
    fn test_decode_strips_bom() {
        let bytes = b"\xEF\xBB\xBFabc";
        assert_eq!(decode(bytes, "auto").unwrap(), "abc");
    }

    #[test]
    fn test_decode_cp932_label() {
        let (bytes, _, _) = SHIFT_JIS.encode("運行日");
        assert_eq!(decode(&bytes, "CP932").unwrap(), "運行日");
    }

    #[test]
    fn test_decode_unknown_label() {
        let err = decode(b"abc", "klingon").unwrap_err();
        assert!(matches!(err, Error::UnknownEncoding(_)));
    }
}
