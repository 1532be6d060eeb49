/*!
Miscellaneous utilities for `closeburn`
*/

use crate::GpuFloat;
use chrono::{NaiveDate, TimeZone, Utc};
use num::{Float, NumCast};

/// Convert a calendar date to the unix timestamp of its midnight, UTC
pub fn to_timestamp(date: NaiveDate) -> i64 {
    Utc.from_utc_datetime(&date.and_hms(0, 0, 0)).timestamp()
}

/// Convert a unix timestamp, shifted by an exchange's offset from UTC in seconds, to the exchange's calendar date
pub fn exchange_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    Utc.timestamp_opt(timestamp + gmtoffset, 0)
        .single()
        .map(|t| t.naive_utc().date())
}

/// Narrow a slice of floats to the GPU float type, mapping anything unrepresentable to zero
pub fn to_gpu<F: Float>(values: &[F]) -> impl Iterator<Item = GpuFloat> + '_ {
    values
        .iter()
        .map(|v| NumCast::from(*v).unwrap_or(0.0))
}

/// The arithmetic mean of a slice, or `None` if it is empty
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip_through_dates() {
        let date = NaiveDate::from_ymd(2014, 1, 2);
        assert_eq!(to_timestamp(date), 1_388_620_800);
        assert_eq!(exchange_date(to_timestamp(date), 0), Some(date));
        // 14:30 UTC is 09:30 in New York, same day
        assert_eq!(exchange_date(1_388_673_000, -18_000), Some(date));
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
    }

    #[test]
    fn gpu_narrowing() {
        let narrowed: Vec<f32> = to_gpu(&[0.5f64, 2.0]).collect();
        assert_eq!(narrowed, vec![0.5f32, 2.0]);
    }
}
