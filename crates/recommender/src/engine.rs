use crate::recommendation::OptimizationRecommendation;
use crate::rules::{default_rules, Rule, RuleContext};
use analytics::{LayerMetrics, MetricsOutcome};
use attribution::{AmpAttribution, CorrelationMatrix};
use configuration::RecommenderSettings;

/// Evaluates a rule table against a layer's analytics.
#[derive(Debug, Clone)]
pub struct Recommender {
    settings: RecommenderSettings,
    rules: Vec<Rule>,
}

impl Recommender {
    pub fn new(settings: RecommenderSettings) -> Self {
        Self::with_rules(settings, default_rules())
    }

    pub fn with_rules(settings: RecommenderSettings, rules: Vec<Rule>) -> Self {
        Self { settings, rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Every matching recommendation, ranked by impact and then severity.
    ///
    /// Nothing is truncated; picking the top few is up to the presentation layer.
    pub fn recommend(
        &self,
        metrics: &LayerMetrics,
        attribution: &[AmpAttribution],
        correlation: &CorrelationMatrix,
    ) -> Vec<OptimizationRecommendation> {
        self.evaluate(Some(metrics), attribution, correlation)
    }

    /// Like [`Recommender::recommend`], but accepts an insufficient-data outcome,
    /// in which case only the attribution and correlation rules can fire.
    pub fn recommend_outcome(
        &self,
        metrics: &MetricsOutcome,
        attribution: &[AmpAttribution],
        correlation: &CorrelationMatrix,
    ) -> Vec<OptimizationRecommendation> {
        self.evaluate(metrics.metrics(), attribution, correlation)
    }

    fn evaluate(
        &self,
        metrics: Option<&LayerMetrics>,
        attribution: &[AmpAttribution],
        correlation: &CorrelationMatrix,
    ) -> Vec<OptimizationRecommendation> {
        let ctx = RuleContext {
            metrics,
            attribution,
            correlation,
            settings: &self.settings,
        };

        let mut matched: Vec<(usize, OptimizationRecommendation)> = self
            .rules
            .iter()
            .enumerate()
            .filter_map(|(position, rule)| {
                let trigger = (rule.predicate)(&ctx)?;
                tracing::debug!(rule = rule.id, severity = trigger.severity, "Rule matched.");
                Some((
                    position,
                    OptimizationRecommendation {
                        rule_id: rule.id.to_string(),
                        kind: rule.kind,
                        title: rule.title.to_string(),
                        description: trigger.render(rule.description),
                        impact: rule.impact,
                        severity: if trigger.severity.is_finite() { trigger.severity } else { 0.0 },
                        action_items: rule.action_items.iter().map(|item| trigger.render(item)).collect(),
                    },
                ))
            })
            .collect();

        matched.sort_by(|(pa, a), (pb, b)| {
            a.impact
                .rank()
                .cmp(&b.impact.rank())
                .then_with(|| b.severity.total_cmp(&a.severity))
                .then_with(|| pa.cmp(pb))
        });

        matched.into_iter().map(|(_, rec)| rec).collect()
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(RecommenderSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::{Impact, RecommendationType};
    use analytics::{MetricFlag, ProfitFactor, TradeStats};
    use attribution::CorrelationFlag;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;
    use std::time::Duration;

    /// A healthy layer that trips no rule.
    fn metrics() -> LayerMetrics {
        LayerMetrics {
            sharpe_ratio: 1.2,
            sortino_ratio: 1.8,
            calmar_ratio: 1.1,
            volatility: 0.15,
            total_return: 0.12,
            annualized_return: 0.18,
            max_drawdown: -0.08,
            current_drawdown: -0.01,
            max_drawdown_duration: 6,
            max_drawdown_recovered: true,
            value_at_risk_95: -0.012,
            value_at_risk_99: -0.02,
            conditional_var_95: -0.018,
            conditional_var_99: -0.025,
            trades: TradeStats {
                total_trades: 40,
                winning_trades: 22,
                losing_trades: 18,
                flat_trades: 0,
                win_rate: 0.55,
                net_pnl: dec!(1300),
                gross_profit: dec!(4400),
                gross_loss: dec!(-3100),
                avg_win: dec!(200),
                avg_loss: dec!(-172.2),
                expectancy: dec!(32.5),
                profit_factor: ProfitFactor::Finite(1.42),
                current_streak: 2,
                longest_win_streak: 5,
                longest_loss_streak: 3,
                average_holding_period: Duration::from_secs(3600),
            },
            daily_points: 90,
            skipped_equity_points: 0,
            flags: BTreeSet::new(),
        }
    }

    fn amp(id: &str, score: f64, execution_rate: Option<f64>) -> AmpAttribution {
        AmpAttribution {
            amp_id: id.into(),
            amp_name: id.to_uppercase(),
            total_pnl: Decimal::ONE,
            win_rate: 0.5,
            trades_executed: 10,
            signals_generated: 12,
            execution_rate,
            risk_adjusted_pnl: 1.0,
            contribution_score: score,
        }
    }

    fn attribution() -> Vec<AmpAttribution> {
        vec![amp("a", 40.0, Some(0.9)), amp("b", 35.0, Some(0.8)), amp("c", 25.0, Some(0.95))]
    }

    fn correlation(score: f64, average: f64) -> CorrelationMatrix {
        CorrelationMatrix {
            amp_ids: vec!["a".into(), "b".into()],
            values: vec![vec![Some(1.0), Some(average)], vec![Some(average), Some(1.0)]],
            average_correlation: Some(average),
            diversification_score: score,
            flags: BTreeSet::new(),
        }
    }

    fn ids(recs: &[OptimizationRecommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.rule_id.as_str()).collect()
    }

    #[test]
    fn healthy_layer_gets_no_recommendations() {
        let recs = Recommender::default().recommend(&metrics(), &attribution(), &correlation(70.0, 0.3));
        assert!(recs.is_empty(), "unexpected: {:?}", ids(&recs));
    }

    #[test]
    fn deep_drawdown_is_a_high_impact_warning() {
        let mut m = metrics();
        m.max_drawdown = -0.27;
        let recs = Recommender::default().recommend(&m, &attribution(), &correlation(70.0, 0.3));

        assert_eq!(ids(&recs), vec!["deep_drawdown"]);
        assert_eq!(recs[0].kind, RecommendationType::Warning);
        assert_eq!(recs[0].impact, Impact::High);
        assert!(recs[0].description.contains("-27.0%"));
        assert!(recs[0].description.contains("-20.0%"));
        assert_eq!(recs[0].action_items.len(), 3);
    }

    #[test]
    fn low_win_rate_needs_a_minimum_sample() {
        let mut m = metrics();
        m.trades.win_rate = 0.3;
        m.trades.total_trades = 19;
        assert!(Recommender::default().recommend(&m, &attribution(), &correlation(70.0, 0.3)).is_empty());

        m.trades.total_trades = 20;
        let recs = Recommender::default().recommend(&m, &attribution(), &correlation(70.0, 0.3));
        assert_eq!(ids(&recs), vec!["low_win_rate"]);
        assert_eq!(recs[0].kind, RecommendationType::Suggestion);
        assert_eq!(recs[0].impact, Impact::Medium);
    }

    #[test]
    fn low_diversification_is_suggested() {
        let recs = Recommender::default().recommend(&metrics(), &attribution(), &correlation(30.0, 0.7));
        assert_eq!(ids(&recs), vec!["low_diversification"]);
        assert!(recs[0].description.contains("0.70"));
    }

    #[test]
    fn strong_sharpe_is_a_low_impact_insight() {
        let mut m = metrics();
        m.sharpe_ratio = 2.6;
        let recs = Recommender::default().recommend(&m, &attribution(), &correlation(70.0, 0.3));
        assert_eq!(ids(&recs), vec!["strong_sharpe"]);
        assert_eq!(recs[0].kind, RecommendationType::Insight);
        assert_eq!(recs[0].impact, Impact::Low);
    }

    #[test]
    fn low_execution_rate_names_the_amps() {
        let rows = vec![amp("a", 40.0, Some(0.3)), amp("b", 35.0, None), amp("c", 25.0, Some(0.45))];
        let recs = Recommender::default().recommend(&metrics(), &rows, &correlation(70.0, 0.3));

        assert_eq!(ids(&recs), vec!["low_execution_rate"]);
        assert_eq!(recs[0].impact, Impact::Medium);
        assert!(recs[0].description.contains("A (30.0%)"));
        assert!(recs[0].description.contains("C (45.0%)"));
        assert!(!recs[0].description.contains('B'));
        assert!(recs[0].action_items[0].contains("A (30.0%)"));
    }

    #[test]
    fn ranks_by_impact_then_severity() {
        let mut m = metrics();
        m.max_drawdown = -0.22;
        m.trades.profit_factor = ProfitFactor::Finite(0.5);
        m.sharpe_ratio = 2.1;
        m.trades.win_rate = 0.2;
        let recs = Recommender::default().recommend(&m, &attribution(), &correlation(45.0, 0.55));

        // High: profit factor (0.5 past) before drawdown (0.02 past).
        // Medium: win rate (0.2 past) before diversification (0.05 past). Low: sharpe.
        assert_eq!(
            ids(&recs),
            vec!["profit_factor_below_one", "deep_drawdown", "low_win_rate", "low_diversification", "strong_sharpe"]
        );
        assert!(recs.windows(2).all(|w| w[0].impact.rank() <= w[1].impact.rank()));
    }

    #[test]
    fn negative_sharpe_ignores_zero_volatility() {
        let mut m = metrics();
        m.sharpe_ratio = -0.4;
        let recs = Recommender::default().recommend(&m, &attribution(), &correlation(70.0, 0.3));
        assert_eq!(ids(&recs), vec!["negative_sharpe"]);

        m.sharpe_ratio = 0.0;
        m.flags.insert(MetricFlag::ZeroVolatility);
        assert!(Recommender::default().recommend(&m, &attribution(), &correlation(70.0, 0.3)).is_empty());
    }

    #[test]
    fn unrecovered_drawdown_and_streak_and_tail() {
        let mut m = metrics();
        m.max_drawdown_recovered = false;
        m.max_drawdown_duration = 45;
        m.trades.longest_loss_streak = 7;
        m.conditional_var_99 = -0.09;
        let recs = Recommender::default().recommend(&m, &attribution(), &correlation(70.0, 0.3));

        let found = ids(&recs);
        assert!(found.contains(&"unrecovered_drawdown"));
        assert!(found.contains(&"losing_streak"));
        assert!(found.contains(&"tail_risk"));
        assert!(recs.iter().any(|r| r.description.contains("45 days")));
    }

    #[test]
    fn dominant_amp_is_flagged() {
        let rows = vec![amp("a", 82.0, Some(0.9)), amp("b", 10.0, Some(0.9)), amp("c", 8.0, Some(0.9))];
        let recs = Recommender::default().recommend(&metrics(), &rows, &correlation(70.0, 0.3));
        assert_eq!(ids(&recs), vec!["contribution_concentration"]);
        assert!(recs[0].action_items[0].contains('A'));
    }

    #[test]
    fn correlated_pair_uses_amp_names() {
        let rows = vec![amp("a", 50.0, Some(0.9)), amp("b", 50.0, Some(0.9))];
        let recs = Recommender::default().recommend(&metrics(), &rows, &correlation(60.0, 0.9));
        assert!(ids(&recs).contains(&"correlated_pair"));
        let pair = recs.iter().find(|r| r.rule_id == "correlated_pair").unwrap();
        assert_eq!(pair.description, "A and B have a correlation of 0.90.");
    }

    #[test]
    fn insufficient_data_only_runs_layer_structure_rules() {
        let outcome = MetricsOutcome::InsufficientData(analytics::InsufficientData {
            reason: analytics::InsufficiencyReason::TooFewTrades,
            required: 2,
            daily_points: 0,
            skipped_equity_points: 0,
            trades: metrics().trades,
        });
        let mut single = correlation(100.0, 0.0);
        single.amp_ids.truncate(1);
        single.values = vec![vec![Some(1.0)]];
        single.average_correlation = None;
        single.flags.insert(CorrelationFlag::InsufficientAmps);

        let rows = vec![amp("a", 100.0, Some(0.2))];
        let recs = Recommender::default().recommend_outcome(&outcome, &rows, &single);
        assert_eq!(ids(&recs), vec!["low_execution_rate", "insufficient_amps"]);
    }

    #[test]
    fn recommendations_serialize_with_a_type_field() {
        let mut m = metrics();
        m.sharpe_ratio = 3.0;
        let recs = Recommender::default().recommend(&m, &attribution(), &correlation(70.0, 0.3));
        let json = serde_json::to_value(&recs[0]).unwrap();
        assert_eq!(json["type"], "insight");
        assert_eq!(json["impact"], "low");
    }
}
