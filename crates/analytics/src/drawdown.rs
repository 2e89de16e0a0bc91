use crate::returns::DailyClose;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Drawdown measurements over a daily close series. All depths are `<= 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownStats {
    pub max_drawdown: f64,
    pub current_drawdown: f64,
    /// Days from the peak preceding the worst trough to recovery (or to the
    /// last close when unrecovered, in which case this is a lower bound).
    pub max_drawdown_duration_days: i64,
    pub recovered: bool,
    pub peak_date: Option<NaiveDate>,
    pub trough_date: Option<NaiveDate>,
    pub recovery_date: Option<NaiveDate>,
}

impl Default for DrawdownStats {
    fn default() -> Self {
        Self {
            max_drawdown: 0.0,
            current_drawdown: 0.0,
            max_drawdown_duration_days: 0,
            recovered: true,
            peak_date: None,
            trough_date: None,
            recovery_date: None,
        }
    }
}

/// One excursion below a running peak.
#[derive(Debug, Clone, Copy)]
struct Episode {
    peak_date: NaiveDate,
    trough_date: NaiveDate,
    depth: f64,
    recovery_date: Option<NaiveDate>,
}

/// Walks the closes once, tracking the running peak `P_t = max(E_0..E_t)`.
///
/// A close equal to the peak counts as recovery and moves the peak date forward,
/// so a flat stretch before a decline dates the episode from its last day.
///
/// The peak is anchored at the first positive close; closes before it cannot
/// define a drawdown. Later closes may fall to zero or below, giving depths of
/// -1 or less.
pub fn drawdown_stats(closes: &[DailyClose]) -> DrawdownStats {
    let Some(start) = closes.iter().position(|c| c.equity > 0.0) else {
        return DrawdownStats::default();
    };
    let closes = &closes[start..];
    let (first, last) = (&closes[0], &closes[closes.len() - 1]);

    let mut peak = first.equity;
    let mut peak_date = first.date;
    let mut current: Option<Episode> = None;
    let mut episodes: Vec<Episode> = Vec::new();
    let mut current_drawdown = 0.0;

    for close in closes {
        if close.equity >= peak {
            if let Some(mut episode) = current.take() {
                episode.recovery_date = Some(close.date);
                episodes.push(episode);
            }
            peak = close.equity;
            peak_date = close.date;
            current_drawdown = 0.0;
            continue;
        }

        let depth = (close.equity - peak) / peak;
        current_drawdown = depth;
        match current.as_mut() {
            Some(episode) if depth < episode.depth => {
                episode.depth = depth;
                episode.trough_date = close.date;
            }
            Some(_) => {}
            None => {
                current = Some(Episode {
                    peak_date,
                    trough_date: close.date,
                    depth,
                    recovery_date: None,
                });
            }
        }
    }
    episodes.extend(current);

    // Strict comparison keeps the earliest of equally deep episodes.
    let worst = episodes.into_iter().fold(None::<Episode>, |worst, ep| match worst {
        Some(w) if w.depth <= ep.depth => Some(w),
        _ => Some(ep),
    });

    match worst {
        None => DrawdownStats {
            current_drawdown,
            ..DrawdownStats::default()
        },
        Some(ep) => {
            let end = ep.recovery_date.unwrap_or(last.date);
            DrawdownStats {
                max_drawdown: ep.depth,
                current_drawdown,
                max_drawdown_duration_days: (end - ep.peak_date).num_days(),
                recovered: ep.recovery_date.is_some(),
                peak_date: Some(ep.peak_date),
                trough_date: Some(ep.trough_date),
                recovery_date: ep.recovery_date,
            }
        }
    }
}
