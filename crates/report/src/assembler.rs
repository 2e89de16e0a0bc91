use crate::cache::{CacheKey, SnapshotCache};
use crate::error::ReportError;
use crate::ledger::{LedgerSnapshot, TradeLedger};
use crate::snapshot::{LayerReport, ReportDiagnostics};
use analytics::{MetricsEngine, ReturnSeries};
use attribution::AttributionAnalyzer;
use configuration::AnalyticsConfig;
use core_types::{AmpId, LayerId};
use futures::future::join_all;
use recommender::Recommender;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds `LayerReport`s from ledger snapshots.
///
/// The metrics engine and attribution analyzer are CPU-bound and independent, so
/// each runs on the blocking pool and the two are joined before the recommender
/// sees their output.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    metrics: Arc<MetricsEngine>,
    attribution: Arc<AttributionAnalyzer>,
    recommender: Arc<Recommender>,
}

impl ReportAssembler {
    pub fn new(config: &AnalyticsConfig) -> Result<Self, ReportError> {
        Ok(Self::from_engines(
            MetricsEngine::new(config.metrics.clone())?,
            AttributionAnalyzer::new(&config.attribution)?,
            Recommender::new(config.recommender.clone()),
        ))
    }

    pub fn from_engines(metrics: MetricsEngine, attribution: AttributionAnalyzer, recommender: Recommender) -> Self {
        Self {
            metrics: Arc::new(metrics),
            attribution: Arc::new(attribution),
            recommender: Arc::new(recommender),
        }
    }

    #[tracing::instrument(skip_all, fields(layer_id = %snapshot.layer_id, trades = snapshot.trades.len()))]
    pub async fn assemble(&self, snapshot: LedgerSnapshot) -> Result<LayerReport, ReportError> {
        let snapshot = Arc::new(snapshot);

        let metrics_task = {
            let engine = Arc::clone(&self.metrics);
            let snapshot = Arc::clone(&snapshot);
            tokio::task::spawn_blocking(move || engine.compute(&snapshot.trades, &snapshot.layer_equity))
        };

        let attribution_task = {
            let engine = Arc::clone(&self.metrics);
            let analyzer = Arc::clone(&self.attribution);
            let snapshot = Arc::clone(&snapshot);
            tokio::task::spawn_blocking(move || {
                let rows = analyzer.attribute(&snapshot.trades, &snapshot.roster);
                let series: BTreeMap<AmpId, ReturnSeries> = snapshot
                    .amp_equity
                    .iter()
                    .map(|(amp_id, curve)| (amp_id.clone(), engine.daily_returns(curve)))
                    .collect();
                let without_equity: Vec<AmpId> = rows
                    .iter()
                    .filter(|row| !snapshot.amp_equity.contains_key(&row.amp_id))
                    .map(|row| row.amp_id.clone())
                    .collect();
                (rows, analyzer.correlate(&series), without_equity)
            })
        };

        let (metrics, (attribution, correlation, amps_without_equity)) =
            tokio::try_join!(metrics_task, attribution_task)?;

        let recommendations = self.recommender.recommend_outcome(&metrics, &attribution, &correlation);

        if !amps_without_equity.is_empty() {
            tracing::warn!(
                amps = amps_without_equity.len(),
                "Some amps have no equity series and were left out of correlation analysis."
            );
        }
        tracing::info!(
            insufficient = metrics.is_insufficient(),
            recommendations = recommendations.len(),
            "Layer report assembled."
        );

        let skipped_equity_points = metrics.skipped_equity_points();
        Ok(LayerReport {
            layer_id: snapshot.layer_id.clone(),
            last_trade_id: snapshot.last_trade_id(),
            metrics,
            attribution,
            correlation,
            recommendations,
            diagnostics: ReportDiagnostics {
                skipped_records: snapshot.skipped_records,
                skipped_equity_points,
                amps_without_equity,
            },
        })
    }

    /// Fetches one layer from the ledger and assembles its report.
    #[tracing::instrument(skip(self, ledger))]
    pub async fn report(&self, ledger: &dyn TradeLedger, layer_id: &LayerId) -> Result<LayerReport, ReportError> {
        let snapshot = ledger.layer_snapshot(layer_id).await?;
        self.assemble(snapshot).await
    }

    /// Like [`ReportAssembler::report`], memoised on `(layer_id, last_trade_id)`.
    pub async fn report_cached(
        &self,
        cache: &SnapshotCache,
        ledger: &dyn TradeLedger,
        layer_id: &LayerId,
    ) -> Result<Arc<LayerReport>, ReportError> {
        let snapshot = ledger.layer_snapshot(layer_id).await?;
        let key = CacheKey {
            layer_id: layer_id.clone(),
            last_trade_id: snapshot.last_trade_id(),
        };
        cache.get_or_compute(key, || self.assemble(snapshot)).await
    }

    /// Reports on several layers concurrently. One failing layer does not stop the rest.
    #[tracing::instrument(skip_all, fields(layers = layer_ids.len()))]
    pub async fn assemble_layers(
        &self,
        ledger: &dyn TradeLedger,
        layer_ids: &[LayerId],
    ) -> Vec<(LayerId, Result<LayerReport, ReportError>)> {
        let tasks = layer_ids
            .iter()
            .map(|layer_id| async move { (layer_id.clone(), self.report(ledger, layer_id).await) });
        let results = join_all(tasks).await;

        let failed = results.iter().filter(|(_, result)| result.is_err()).count();
        if failed > 0 {
            tracing::warn!(failed, "Some layer reports could not be assembled.");
        }
        results
    }
}
