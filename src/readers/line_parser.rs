use crate::error::{PipelineError, Result};
use crate::models::Observation;
use crate::utils::constants::{MISSING_SENTINEL, TENTHS_PER_UNIT};
use chrono::NaiveDate;

/// Parse one tab-delimited observation line.
///
/// Expected format: `<YYYYMMDD>\t<max_temp_tenths>\t<min_temp_tenths>\t<precip_tenths>`
/// where each measurement is an integer in tenths of a unit and the literal
/// sentinel `-9999` marks a missing value.
///
/// Pure function, safe to call from any number of concurrent workers.
pub fn parse_observation_line(line: &str, station: &str) -> Result<Observation> {
    let fields: Vec<&str> = line.trim().split('\t').collect();

    if fields.len() != 4 {
        return Err(PipelineError::MalformedRecord {
            fields: fields.len(),
        });
    }

    let date = parse_compact_date(fields[0])?;
    let max_temp = parse_tenths(fields[1])?;
    let min_temp = parse_tenths(fields[2])?;
    let precipitation = parse_tenths(fields[3])?;

    Ok(Observation::new(
        date,
        station.to_string(),
        max_temp,
        min_temp,
        precipitation,
    ))
}

/// Parse an 8-digit YYYYMMDD date field.
fn parse_compact_date(field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(field.trim(), "%Y%m%d").map_err(|_| PipelineError::MalformedDate {
        value: field.trim().to_string(),
    })
}

/// Parse an integer-tenths measurement into real units.
///
/// The sentinel maps to `None`, never to a computed -999.9.
fn parse_tenths(field: &str) -> Result<Option<f64>> {
    let field = field.trim();

    if field == MISSING_SENTINEL {
        return Ok(None);
    }

    let tenths = field
        .parse::<i64>()
        .map_err(|_| PipelineError::MalformedNumber {
            value: field.to_string(),
        })?;

    Ok(Some(tenths as f64 / TENTHS_PER_UNIT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_line() {
        let obs = parse_observation_line("20200101\t100\t-50\t-9999", "USC00110072").unwrap();

        assert_eq!(obs.date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(obs.station, "USC00110072");
        assert_eq!(obs.max_temp, Some(10.0));
        assert_eq!(obs.min_temp, Some(-5.0));
        assert_eq!(obs.precipitation, None);
    }

    #[test]
    fn test_sentinel_in_every_position() {
        let obs = parse_observation_line("19850630\t-9999\t-9999\t-9999", "X").unwrap();
        assert_eq!(obs.max_temp, None);
        assert_eq!(obs.min_temp, None);
        assert_eq!(obs.precipitation, None);
        assert!(!obs.is_complete());
    }

    #[test]
    fn test_malformed_date() {
        let err = parse_observation_line("2020-01-01\t100\t50\t0", "X").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedDate { .. }));

        let err = parse_observation_line("202001\t100\t50\t0", "X").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedDate { .. }));
    }

    #[test]
    fn test_malformed_number() {
        let err = parse_observation_line("20200101\tten\t50\t0", "X").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedNumber { ref value } if value == "ten"
        ));

        // Floats in the raw file are malformed; the format is integer tenths
        let err = parse_observation_line("20200101\t10.5\t50\t0", "X").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedNumber { .. }));
    }

    #[test]
    fn test_wrong_field_count() {
        let err = parse_observation_line("20200101\t100\t50", "X").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedRecord { fields: 3 }));
    }

    #[test]
    fn test_trailing_whitespace_trimmed() {
        let obs = parse_observation_line("20200101\t100\t50\t0\n", "X").unwrap();
        assert_eq!(obs.precipitation, Some(0.0));
    }

    #[test]
    fn test_negative_tenths() {
        let obs = parse_observation_line("20200101\t-328\t-456\t0", "X").unwrap();
        assert_eq!(obs.max_temp, Some(-32.8));
        assert_eq!(obs.min_temp, Some(-45.6));
    }
}
