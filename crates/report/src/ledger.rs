use crate::error::ReportError;
use async_trait::async_trait;
use core_types::{parse_trades, AmpId, AmpMeta, EquityPoint, LayerId, RawTrade, Trade};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

/// Everything the engines need to report on one layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSnapshot {
    pub layer_id: LayerId,
    pub trades: Vec<Trade>,
    /// Raw trade records for this layer that failed validation.
    pub skipped_records: usize,
    pub layer_equity: Vec<EquityPoint>,
    pub amp_equity: BTreeMap<AmpId, Vec<EquityPoint>>,
    pub roster: Vec<AmpMeta>,
}

impl LedgerSnapshot {
    /// The most recently settled trade, by exit time and then id.
    ///
    /// Together with the layer id this identifies the state of the layer, so a
    /// report keyed on it stays valid until another trade settles.
    pub fn last_trade_id(&self) -> Option<Uuid> {
        self.trades
            .iter()
            .max_by(|a, b| a.exit_time.cmp(&b.exit_time).then_with(|| a.trade_id.cmp(&b.trade_id)))
            .map(|t| t.trade_id)
    }
}

/// A source of closed trades and equity marks, one layer at a time.
#[async_trait]
pub trait TradeLedger: Send + Sync {
    async fn layer_snapshot(&self, layer_id: &LayerId) -> Result<LedgerSnapshot, ReportError>;

    async fn layers(&self) -> Result<Vec<LayerId>, ReportError>;
}

/// The JSON layout of a ledger export.
///
/// Trades are a flat list carrying their own `layer_id`, the way the ledger
/// stores them; layers carry the roster and equity marks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerExport {
    #[serde(default)]
    pub layers: Vec<LayerExport>,
    #[serde(default)]
    pub trades: Vec<RawTrade>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerExport {
    pub layer_id: LayerId,
    #[serde(default)]
    pub roster: Vec<AmpMeta>,
    #[serde(default)]
    pub equity: Vec<EquityPoint>,
    #[serde(default)]
    pub amp_equity: BTreeMap<AmpId, Vec<EquityPoint>>,
}

/// A ledger held entirely in memory, usually loaded from a JSON export.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    snapshots: BTreeMap<LayerId, LedgerSnapshot>,
    /// Records that could not be assigned to any layer.
    unassigned_records: usize,
}

impl InMemoryLedger {
    pub fn from_export(export: LedgerExport) -> Self {
        let mut snapshots: BTreeMap<LayerId, LedgerSnapshot> = export
            .layers
            .into_iter()
            .map(|layer| {
                let snapshot = LedgerSnapshot {
                    layer_id: layer.layer_id.clone(),
                    layer_equity: layer.equity,
                    amp_equity: layer.amp_equity,
                    roster: layer.roster,
                    ..Default::default()
                };
                (layer.layer_id, snapshot)
            })
            .collect();

        let mut by_layer: BTreeMap<LayerId, Vec<RawTrade>> = BTreeMap::new();
        let mut unassigned_records = 0;
        for raw in export.trades {
            match raw.layer_id.as_deref().filter(|id| !id.is_empty()) {
                Some(id) => by_layer.entry(LayerId::from(id)).or_default().push(raw),
                None => unassigned_records += 1,
            }
        }
        if unassigned_records > 0 {
            tracing::warn!(count = unassigned_records, "Skipped trade records with no layer id.");
        }

        for (layer_id, raw) in by_layer {
            let validated = parse_trades(raw);
            let snapshot = snapshots.entry(layer_id.clone()).or_insert_with(|| {
                tracing::warn!(layer_id = %layer_id, "Trades reference a layer with no roster or equity in the export.");
                LedgerSnapshot {
                    layer_id: layer_id.clone(),
                    ..Default::default()
                }
            });
            snapshot.trades = validated.trades;
            snapshot.skipped_records = validated.skipped_records;
        }

        tracing::info!(
            layers = snapshots.len(),
            unassigned_records,
            "Loaded ledger export."
        );
        Self {
            snapshots,
            unassigned_records,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ReportError> {
        let export: LedgerExport = serde_json::from_str(json)?;
        Ok(Self::from_export(export))
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&json)
    }

    /// Replaces or adds a layer.
    pub fn insert(&mut self, snapshot: LedgerSnapshot) {
        self.snapshots.insert(snapshot.layer_id.clone(), snapshot);
    }

    pub fn unassigned_records(&self) -> usize {
        self.unassigned_records
    }
}

#[async_trait]
impl TradeLedger for InMemoryLedger {
    async fn layer_snapshot(&self, layer_id: &LayerId) -> Result<LedgerSnapshot, ReportError> {
        self.snapshots
            .get(layer_id)
            .cloned()
            .ok_or_else(|| ReportError::UnknownLayer(layer_id.clone()))
    }

    async fn layers(&self) -> Result<Vec<LayerId>, ReportError> {
        Ok(self.snapshots.keys().cloned().collect())
    }
}
