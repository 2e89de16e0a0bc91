use chrono::NaiveDate;
use core_types::EquityPoint;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// The last equity observation of a UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub equity: f64,
}

/// An equity curve resampled to one close per day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyCloses {
    pub closes: Vec<DailyClose>,
    /// Points dropped because their equity is not representable as a finite `f64`.
    pub skipped_points: usize,
}

/// A simple return `(E_t - E_{t-1}) / E_{t-1}`, dated by the later close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyReturn {
    pub date: NaiveDate,
    pub value: f64,
}

/// Dated daily returns in ascending date order.
pub type ReturnSeries = Vec<DailyReturn>;

/// Resamples an irregularly sampled equity curve to daily closes.
///
/// The input is sorted first (stable, so same-timestamp points keep their
/// ledger order) and the last observation of each calendar day wins. Zero and
/// negative equity are kept: a wiped-out account is a valid close.
pub fn resample_daily(curve: &[EquityPoint]) -> DailyCloses {
    let mut ordered: Vec<&EquityPoint> = curve.iter().collect();
    ordered.sort_by_key(|p| p.timestamp);

    let mut resampled = DailyCloses::default();
    for point in ordered {
        let equity = match point.equity_value.to_f64() {
            Some(v) if v.is_finite() => v,
            _ => {
                tracing::warn!(
                    timestamp = %point.timestamp,
                    equity = %point.equity_value,
                    "Dropping equity point that is not representable."
                );
                resampled.skipped_points += 1;
                continue;
            }
        };
        let date = point.timestamp.date_naive();
        match resampled.closes.last_mut() {
            Some(last) if last.date == date => last.equity = equity,
            _ => resampled.closes.push(DailyClose { date, equity }),
        }
    }
    resampled
}

/// Builds the daily return series from consecutive closes.
///
/// A return is only defined over a positive base, so a day following a
/// non-positive close has no return; see [`unanchored_returns`].
pub fn daily_returns(closes: &[DailyClose]) -> ReturnSeries {
    closes
        .windows(2)
        .filter(|w| w[0].equity > 0.0)
        .map(|w| DailyReturn {
            date: w[1].date,
            value: (w[1].equity - w[0].equity) / w[0].equity,
        })
        .collect()
}

/// Number of consecutive-close pairs left out of [`daily_returns`] because
/// their base close was zero or negative.
pub fn unanchored_returns(closes: &[DailyClose]) -> usize {
    closes.windows(2).filter(|w| w[0].equity <= 0.0).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn point(day: u32, hour: u32, equity: rust_decimal::Decimal) -> EquityPoint {
        EquityPoint::new(Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap(), equity)
    }

    #[test]
    fn keeps_the_last_observation_of_each_day() {
        let curve = vec![
            point(2, 9, dec!(105)),
            point(1, 9, dec!(100)),
            point(1, 17, dec!(102)),
            point(2, 16, dec!(110)),
        ];
        let resampled = resample_daily(&curve);
        let equities: Vec<f64> = resampled.closes.iter().map(|c| c.equity).collect();
        assert_eq!(equities, vec![102.0, 110.0]);
        assert_eq!(resampled.skipped_points, 0);
    }

    #[test]
    fn keeps_zero_and_negative_closes() {
        let curve = vec![point(1, 0, dec!(100)), point(2, 0, dec!(0)), point(3, 0, dec!(-5))];
        let resampled = resample_daily(&curve);
        let equities: Vec<f64> = resampled.closes.iter().map(|c| c.equity).collect();
        assert_eq!(equities, vec![100.0, 0.0, -5.0]);
        assert_eq!(resampled.skipped_points, 0);
    }

    #[test]
    fn no_return_is_taken_over_a_non_positive_base() {
        let curve = vec![
            point(1, 0, dec!(100)),
            point(2, 0, dec!(50)),
            point(3, 0, dec!(0)),
            point(4, 0, dec!(100)),
        ];
        let closes = resample_daily(&curve).closes;
        let values: Vec<f64> = daily_returns(&closes).iter().map(|r| r.value).collect();
        assert_eq!(values, vec![-0.5, -1.0]);
        assert_eq!(unanchored_returns(&closes), 1);
    }

    #[test]
    fn returns_are_dated_by_the_later_close() {
        let resampled = resample_daily(&[point(1, 0, dec!(100)), point(4, 0, dec!(110))]);
        let returns = daily_returns(&resampled.closes);
        assert_eq!(returns.len(), 1);
        assert_eq!(returns[0].date, NaiveDate::from_ymd_opt(2024, 5, 4).unwrap());
        assert!((returns[0].value - 0.1).abs() < 1e-12);
    }
}
