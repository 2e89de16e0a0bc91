use crate::policy::{ContributionInput, ContributionPolicy};
use analytics::stats::{self, MIN_DEVIATION};
use core_types::{AmpId, AmpMeta, Trade, TradeOutcome};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Performance of a single amp within its layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmpAttribution {
    pub amp_id: AmpId,
    pub amp_name: String,
    /// Sum of net PnL (realized minus fees).
    pub total_pnl: Decimal,
    pub win_rate: f64,
    pub trades_executed: usize,
    pub signals_generated: u64,
    /// Executed trades over signals generated, capped at 1. `None` when the amp
    /// reported no signals.
    pub execution_rate: Option<f64>,
    /// Total PnL per unit of per-trade PnL deviation.
    pub risk_adjusted_pnl: f64,
    /// Relative contribution to the layer, 0-100.
    pub contribution_score: f64,
}

/// Groups trades by amp and scores each amp against the rest of the layer.
///
/// Every roster amp appears in the output, even without trades. Trades from amps
/// missing on the roster are still attributed, named by their id.
pub(crate) fn attribute(
    trades: &[Trade],
    roster: &[AmpMeta],
    policy: &dyn ContributionPolicy,
) -> Vec<AmpAttribution> {
    let roster_by_id: HashMap<&AmpId, &AmpMeta> = roster.iter().map(|m| (&m.amp_id, m)).collect();

    let mut grouped: BTreeMap<&AmpId, Vec<&Trade>> = roster.iter().map(|m| (&m.amp_id, Vec::new())).collect();
    for trade in trades {
        grouped.entry(&trade.amp_id).or_default().push(trade);
    }

    let mut rows: Vec<AmpAttribution> = grouped
        .into_iter()
        .map(|(amp_id, amp_trades)| {
            let meta = roster_by_id.get(amp_id).copied();
            if meta.is_none() {
                tracing::warn!(amp_id = %amp_id, "Trades found for an amp that is not on the layer roster.");
            }
            summarize(amp_id, meta, &amp_trades)
        })
        .collect();

    let inputs: Vec<ContributionInput> = rows
        .iter()
        .map(|row| ContributionInput {
            total_pnl: row.total_pnl.to_f64().unwrap_or(0.0),
            risk_adjusted_pnl: row.risk_adjusted_pnl,
        })
        .collect();
    for (row, score) in rows.iter_mut().zip(policy.scores(&inputs)) {
        row.contribution_score = stats::finite_or(score, 0.0).clamp(0.0, 100.0);
    }

    rows.sort_by(|a, b| {
        b.contribution_score
            .total_cmp(&a.contribution_score)
            .then_with(|| a.amp_id.cmp(&b.amp_id))
    });
    rows
}

fn summarize(amp_id: &AmpId, meta: Option<&AmpMeta>, trades: &[&Trade]) -> AmpAttribution {
    let total_pnl: Decimal = trades.iter().map(|t| t.net_pnl()).sum();
    let wins = trades.iter().filter(|t| t.outcome() == TradeOutcome::Win).count();
    let executed = trades.len();

    let win_rate = if executed > 0 {
        wins as f64 / executed as f64
    } else {
        0.0
    };

    let per_trade: Vec<f64> = trades.iter().filter_map(|t| t.net_pnl().to_f64()).collect();
    let risk_adjusted_pnl = match stats::std_dev(&per_trade) {
        Some(sd) if sd > MIN_DEVIATION => stats::finite_or(total_pnl.to_f64().unwrap_or(0.0) / sd, 0.0),
        _ => 0.0,
    };

    let signals_generated = meta.map(|m| m.signals_generated).unwrap_or(0);
    let execution_rate = if signals_generated == 0 {
        None
    } else {
        let rate = executed as f64 / signals_generated as f64;
        if rate > 1.0 {
            tracing::warn!(
                amp_id = %amp_id,
                executed,
                signals_generated,
                "Amp executed more trades than signals it reported; capping execution rate."
            );
        }
        Some(rate.min(1.0))
    };

    AmpAttribution {
        amp_id: amp_id.clone(),
        amp_name: meta.map(|m| m.amp_name.clone()).unwrap_or_else(|| amp_id.to_string()),
        total_pnl,
        win_rate,
        trades_executed: executed,
        signals_generated,
        execution_rate,
        risk_adjusted_pnl,
        contribution_score: 0.0,
    }
}
