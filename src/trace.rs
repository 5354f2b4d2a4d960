/*!
 * Loading GPS traces from CSV files.
 *
 * The file must have a header row with at least the columns `lat`, `lon`, and `time`. Latitude
 * and longitude are in degrees, time is in milliseconds since the Unix epoch. Any other columns
 * are ignored. The rows are kept in file order, they are assumed to be chronological.
 */

use crate::{FieldTraceError, FieldTraceResult, SchemaError, TracePoint};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};

/// The columns every trace file must have.
pub const REQUIRED_COLUMNS: [&str; 3] = ["lat", "lon", "time"];

#[derive(Debug, Deserialize)]
struct TraceRow {
    lat: f64,
    lon: f64,
    time: i64,
}

/// Load a trace from a CSV file.
pub fn read_trace<P: AsRef<Path>>(path: P) -> FieldTraceResult<Vec<TracePoint>> {
    let f = File::open(path.as_ref())?;
    let points = read_trace_from(f)?;

    log::debug!(
        "read {} points from {}",
        points.len(),
        path.as_ref().display()
    );

    Ok(points)
}

/**
 * Load a trace from anything that produces CSV text.
 *
 * The header is checked before any rows are parsed. If a required column is missing, the error is
 * a [SchemaError] listing all of the missing columns and nothing is returned.
 */
pub fn read_trace_from<R: Read>(rdr: R) -> FieldTraceResult<Vec<TracePoint>> {
    let mut csv_rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let headers = csv_rdr.headers()?;
    let missing: Vec<&'static str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|&col| !headers.iter().any(|h| h == col))
        .collect();

    if !missing.is_empty() {
        return Err(SchemaError { missing }.into());
    }

    let mut points = vec![];
    for row in csv_rdr.deserialize() {
        let TraceRow { lat, lon, time } = row?;

        let timestamp = Utc.timestamp_millis_opt(time).single().ok_or(FieldTraceError {
            msg: "time is out of range for a timestamp",
        })?;

        points.push(TracePoint::new(lat, lon, timestamp));
    }

    Ok(points)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_read_in_file_order() {
        let text = "\
lat,lon,time,speed
18.5,73.8,1600000060000,3.2
18.6,73.9,1600000000000,0.0
";
        let pnts = read_trace_from(text.as_bytes()).unwrap();
        assert_eq!(pnts.len(), 2);

        assert_eq!(pnts[0].lat, 18.5);
        assert_eq!(pnts[0].lon, 73.8);
        assert_eq!(pnts[0].timestamp.timestamp_millis(), 1_600_000_060_000);

        // Not re-sorted by time.
        assert_eq!(pnts[1].timestamp.timestamp_millis(), 1_600_000_000_000);
    }

    #[test]
    fn test_column_order_and_whitespace() {
        let text = "time, lon, lat\n1000, 2.5, -1.25\n";
        let pnts = read_trace_from(text.as_bytes()).unwrap();
        assert_eq!(pnts.len(), 1);
        assert_eq!(pnts[0].lat, -1.25);
        assert_eq!(pnts[0].lon, 2.5);
        assert_eq!(pnts[0].timestamp.timestamp_millis(), 1000);
    }

    #[test]
    fn test_header_only_is_empty_trace() {
        let pnts = read_trace_from("lat,lon,time\n".as_bytes()).unwrap();
        assert!(pnts.is_empty());
    }

    #[test]
    fn test_missing_columns() {
        let err = read_trace_from("lat,lng,timestamp\n1.0,2.0,3\n".as_bytes()).unwrap_err();
        let schema = err.downcast_ref::<SchemaError>().unwrap();
        assert_eq!(schema.missing, vec!["lon", "time"]);

        let err = read_trace_from("".as_bytes()).unwrap_err();
        let schema = err.downcast_ref::<SchemaError>().unwrap();
        assert_eq!(schema.missing, vec!["lat", "lon", "time"]);
    }

    #[test]
    fn test_bad_values() {
        assert!(read_trace_from("lat,lon,time\nabc,2.0,3\n".as_bytes()).is_err());
        assert!(read_trace_from("lat,lon,time\n1.0,2.0,3.5\n".as_bytes()).is_err());
    }
}
