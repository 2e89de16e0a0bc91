//! The recommendation rule table.
//!
//! Each rule is a plain value: a predicate plus the static text it renders.
//! Adding advice means adding an entry to [`default_rules`], not another branch.

use crate::recommendation::{Impact, RecommendationType};
use analytics::{LayerMetrics, MetricFlag, ProfitFactor};
use attribution::{AmpAttribution, CorrelationFlag, CorrelationMatrix};
use configuration::RecommenderSettings;
use core_types::AmpId;
use itertools::Itertools;

/// Everything a rule may inspect. `metrics` is `None` when the layer had too
/// little data for a metrics snapshot; rules that need it simply do not fire.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub metrics: Option<&'a LayerMetrics>,
    pub attribution: &'a [AmpAttribution],
    pub correlation: &'a CorrelationMatrix,
    pub settings: &'a RecommenderSettings,
}

/// What a matching predicate reports back.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    /// Magnitude past the threshold. Larger sorts first within an impact level.
    pub severity: f64,
    /// Values substituted for `{name}` placeholders in the description and action items.
    pub bindings: Vec<(&'static str, String)>,
}

impl Trigger {
    fn new(severity: f64) -> Self {
        Self {
            severity,
            bindings: Vec::new(),
        }
    }

    fn bind(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.bindings.push((name, value.into()));
        self
    }

    /// Fills `{name}` placeholders in `template`.
    pub fn render(&self, template: &str) -> String {
        self.bindings
            .iter()
            .fold(template.to_string(), |text, (name, value)| text.replace(&format!("{{{name}}}"), value))
    }
}

pub type Predicate = fn(&RuleContext<'_>) -> Option<Trigger>;

#[derive(Debug, Clone)]
pub struct Rule {
    pub id: &'static str,
    pub kind: RecommendationType,
    pub impact: Impact,
    pub title: &'static str,
    pub description: &'static str,
    pub action_items: &'static [&'static str],
    pub predicate: Predicate,
}

fn pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "deep_drawdown",
            kind: RecommendationType::Warning,
            impact: Impact::High,
            title: "Drawdown exceeds risk tolerance",
            description: "The layer's maximum drawdown reached {drawdown}, beyond the {threshold} limit.",
            action_items: &[
                "Reduce position sizing across the layer's amps",
                "Add or tighten a layer-level drawdown stop",
                "Review which amps drove the decline in the attribution table",
            ],
            predicate: deep_drawdown,
        },
        Rule {
            id: "negative_sharpe",
            kind: RecommendationType::Warning,
            impact: Impact::High,
            title: "Negative risk-adjusted return",
            description: "A Sharpe ratio of {sharpe} means the layer is being paid less than the risk-free rate for the volatility it takes.",
            action_items: &[
                "Pause or paper-trade the weakest amps",
                "Re-validate entry logic on recent market conditions",
            ],
            predicate: negative_sharpe,
        },
        Rule {
            id: "profit_factor_below_one",
            kind: RecommendationType::Warning,
            impact: Impact::High,
            title: "Losses outweigh gains",
            description: "Gross losses exceed gross profits (profit factor {profit_factor}).",
            action_items: &[
                "Compare average win and average loss to find the imbalance",
                "Tighten stop-losses or let winners run longer",
            ],
            predicate: profit_factor_below_one,
        },
        Rule {
            id: "low_win_rate",
            kind: RecommendationType::Suggestion,
            impact: Impact::Medium,
            title: "Low win rate",
            description: "Only {win_rate} of {trades} trades were profitable, below the {threshold} target.",
            action_items: &[
                "Tighten entry filters to skip marginal setups",
                "Check that the reward-to-risk ratio compensates for the hit rate",
            ],
            predicate: low_win_rate,
        },
        Rule {
            id: "low_diversification",
            kind: RecommendationType::Suggestion,
            impact: Impact::Medium,
            title: "Amps move together",
            description: "The diversification score is {score} with an average pairwise correlation of {average}.",
            action_items: &[
                "Add an amp trading an uncorrelated market or timeframe",
                "Retire one of each highly correlated pair of amps",
            ],
            predicate: low_diversification,
        },
        Rule {
            id: "low_execution_rate",
            kind: RecommendationType::Warning,
            impact: Impact::Medium,
            title: "Signals are not being executed",
            description: "These amps executed fewer than {threshold} of their signals: {amps}.",
            action_items: &[
                "Check broker connectivity and order rejections for: {amps}",
                "Verify position limits are not blocking new entries",
            ],
            predicate: low_execution_rate,
        },
        Rule {
            id: "unrecovered_drawdown",
            kind: RecommendationType::Warning,
            impact: Impact::Medium,
            title: "Long unrecovered drawdown",
            description: "Equity has been below its peak for at least {days} days without recovering.",
            action_items: &[
                "Decide on a maximum time-under-water before reallocating capital",
                "Compare recent amp behaviour with their historical regime",
            ],
            predicate: unrecovered_drawdown,
        },
        Rule {
            id: "tail_risk",
            kind: RecommendationType::Warning,
            impact: Impact::Medium,
            title: "Heavy tail losses",
            description: "On the worst 1% of days the layer lost {cvar} on average (limit {threshold}).",
            action_items: &[
                "Cap exposure around scheduled high-volatility events",
                "Add protective stops to the amps with the largest single-day losses",
            ],
            predicate: tail_risk,
        },
        Rule {
            id: "losing_streak",
            kind: RecommendationType::Suggestion,
            impact: Impact::Medium,
            title: "Extended losing streak",
            description: "The layer has suffered a run of {streak} consecutive losing trades.",
            action_items: &[
                "Consider a cool-down after consecutive losses",
                "Check whether the streak clusters in a single amp or market",
            ],
            predicate: losing_streak,
        },
        Rule {
            id: "contribution_concentration",
            kind: RecommendationType::Suggestion,
            impact: Impact::Medium,
            title: "Performance depends on one amp",
            description: "{amp} accounts for a contribution score of {score} across {count} amps.",
            action_items: &[
                "Stress-test the layer without {amp}",
                "Rebalance capital toward under-contributing amps with positive expectancy",
            ],
            predicate: contribution_concentration,
        },
        Rule {
            id: "strong_sharpe",
            kind: RecommendationType::Insight,
            impact: Impact::Low,
            title: "Strong risk-adjusted performance",
            description: "A Sharpe ratio of {sharpe} is above {threshold}.",
            action_items: &[
                "Consider gradually scaling allocation to this layer",
                "Record the current configuration as a baseline",
            ],
            predicate: strong_sharpe,
        },
        Rule {
            id: "correlated_pair",
            kind: RecommendationType::Suggestion,
            impact: Impact::Low,
            title: "Highly correlated amp pair",
            description: "{a} and {b} have a correlation of {rho}.",
            action_items: &["Check whether {a} and {b} trade the same signals"],
            predicate: correlated_pair,
        },
        Rule {
            id: "insufficient_amps",
            kind: RecommendationType::Insight,
            impact: Impact::Low,
            title: "Single-strategy layer",
            description: "With fewer than two amps there is no inter-strategy diversification to measure.",
            action_items: &["Add a second amp to spread strategy risk"],
            predicate: insufficient_amps,
        },
    ]
}

fn deep_drawdown(ctx: &RuleContext<'_>) -> Option<Trigger> {
    let m = ctx.metrics?;
    let threshold = ctx.settings.max_drawdown_warning;
    (m.max_drawdown < threshold).then(|| {
        Trigger::new(threshold - m.max_drawdown)
            .bind("drawdown", pct(m.max_drawdown))
            .bind("threshold", pct(threshold))
    })
}

fn negative_sharpe(ctx: &RuleContext<'_>) -> Option<Trigger> {
    let m = ctx.metrics?;
    (m.sharpe_ratio < 0.0 && !m.has_flag(MetricFlag::ZeroVolatility))
        .then(|| Trigger::new(-m.sharpe_ratio).bind("sharpe", format!("{:.2}", m.sharpe_ratio)))
}

fn profit_factor_below_one(ctx: &RuleContext<'_>) -> Option<Trigger> {
    let m = ctx.metrics?;
    match m.trades.profit_factor {
        ProfitFactor::Finite(pf) if pf < 1.0 => {
            Some(Trigger::new(1.0 - pf).bind("profit_factor", format!("{pf:.2}")))
        }
        _ => None,
    }
}

fn low_win_rate(ctx: &RuleContext<'_>) -> Option<Trigger> {
    let m = ctx.metrics?;
    let s = ctx.settings;
    (m.trades.win_rate < s.min_win_rate && m.trades.total_trades >= s.min_trades_for_win_rate).then(|| {
        Trigger::new(s.min_win_rate - m.trades.win_rate)
            .bind("win_rate", pct(m.trades.win_rate))
            .bind("trades", m.trades.total_trades.to_string())
            .bind("threshold", pct(s.min_win_rate))
    })
}

fn low_diversification(ctx: &RuleContext<'_>) -> Option<Trigger> {
    let c = ctx.correlation;
    let threshold = ctx.settings.min_diversification_score;
    (c.diversification_score < threshold).then(|| {
        Trigger::new((threshold - c.diversification_score) / 100.0)
            .bind("score", format!("{:.0}", c.diversification_score))
            .bind(
                "average",
                c.average_correlation.map(|a| format!("{a:.2}")).unwrap_or_else(|| "n/a".to_string()),
            )
    })
}

fn low_execution_rate(ctx: &RuleContext<'_>) -> Option<Trigger> {
    let threshold = ctx.settings.min_execution_rate;
    let lagging: Vec<(&AmpAttribution, f64)> = ctx
        .attribution
        .iter()
        .filter_map(|a| a.execution_rate.filter(|r| *r < threshold).map(|r| (a, r)))
        .collect();
    if lagging.is_empty() {
        return None;
    }
    let worst = lagging.iter().map(|(_, r)| threshold - r).fold(0.0, f64::max);
    let amps = lagging
        .iter()
        .map(|(a, r)| format!("{} ({})", a.amp_name, pct(*r)))
        .join(", ");
    Some(Trigger::new(worst).bind("threshold", pct(threshold)).bind("amps", amps))
}

fn unrecovered_drawdown(ctx: &RuleContext<'_>) -> Option<Trigger> {
    let m = ctx.metrics?;
    let days = ctx.settings.unrecovered_drawdown_days;
    (!m.max_drawdown_recovered && m.max_drawdown_duration >= days && days > 0).then(|| {
        Trigger::new(m.max_drawdown_duration as f64 / days as f64).bind("days", m.max_drawdown_duration.to_string())
    })
}

fn tail_risk(ctx: &RuleContext<'_>) -> Option<Trigger> {
    let m = ctx.metrics?;
    let threshold = ctx.settings.cvar99_warning;
    (m.conditional_var_99 < threshold).then(|| {
        Trigger::new(threshold - m.conditional_var_99)
            .bind("cvar", pct(m.conditional_var_99))
            .bind("threshold", pct(threshold))
    })
}

fn losing_streak(ctx: &RuleContext<'_>) -> Option<Trigger> {
    let m = ctx.metrics?;
    let limit = ctx.settings.max_loss_streak;
    let streak = m.trades.longest_loss_streak;
    (limit > 0 && streak >= limit)
        .then(|| Trigger::new(f64::from(streak) / f64::from(limit)).bind("streak", streak.to_string()))
}

fn contribution_concentration(ctx: &RuleContext<'_>) -> Option<Trigger> {
    if ctx.attribution.len() < 3 {
        return None;
    }
    let threshold = ctx.settings.concentration_score;
    let top = ctx
        .attribution
        .iter()
        .max_by(|a, b| a.contribution_score.total_cmp(&b.contribution_score))?;
    (top.contribution_score >= threshold).then(|| {
        Trigger::new((top.contribution_score - threshold) / 100.0)
            .bind("amp", top.amp_name.clone())
            .bind("score", format!("{:.0}", top.contribution_score))
            .bind("count", ctx.attribution.len().to_string())
    })
}

fn strong_sharpe(ctx: &RuleContext<'_>) -> Option<Trigger> {
    let m = ctx.metrics?;
    let threshold = ctx.settings.strong_sharpe;
    (m.sharpe_ratio > threshold).then(|| {
        Trigger::new(m.sharpe_ratio - threshold)
            .bind("sharpe", format!("{:.2}", m.sharpe_ratio))
            .bind("threshold", format!("{threshold:.2}"))
    })
}

fn correlated_pair(ctx: &RuleContext<'_>) -> Option<Trigger> {
    let threshold = ctx.settings.high_pair_correlation;
    let (a, b, rho) = ctx
        .correlation
        .pairs()
        .filter(|(_, _, rho)| *rho >= threshold)
        .max_by(|x, y| x.2.total_cmp(&y.2))?;

    let name = |id: &AmpId| {
        ctx.attribution
            .iter()
            .find(|row| &row.amp_id == id)
            .map(|row| row.amp_name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    Some(
        Trigger::new(rho - threshold)
            .bind("a", name(a))
            .bind("b", name(b))
            .bind("rho", format!("{rho:.2}")),
    )
}

fn insufficient_amps(ctx: &RuleContext<'_>) -> Option<Trigger> {
    ctx.correlation
        .has_flag(CorrelationFlag::InsufficientAmps)
        .then(|| Trigger::new(0.0))
}
