use analytics::{InsufficiencyReason, MetricFlag, MetricsOutcome};
use attribution::CorrelationFlag;
use chrono::{Duration, TimeZone, Utc};
use configuration::AnalyticsConfig;
use core_types::{AmpId, AmpMeta, EquityPoint, LayerId, OrderSide, Trade};
use report::{InMemoryLedger, LedgerSnapshot, ReportAssembler, ReportError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use uuid::Uuid;

const DAYS: i64 = 30;

fn curve(f: impl Fn(i64) -> Decimal) -> Vec<EquityPoint> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 21, 0, 0).unwrap();
    (0..DAYS).map(|i| EquityPoint::new(start + Duration::days(i), f(i))).collect()
}

fn trade(n: u128, amp: &str, pnl: Decimal) -> Trade {
    let entry = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() + Duration::days(n as i64);
    Trade {
        trade_id: Uuid::from_u128(n),
        amp_id: amp.into(),
        layer_id: "core".into(),
        symbol: "BTCUSDT".to_string(),
        side: OrderSide::Buy,
        entry_time: entry,
        exit_time: entry + Duration::hours(3),
        entry_price: dec!(100),
        exit_price: dec!(101),
        quantity: dec!(1),
        realized_pnl: pnl,
        fees: dec!(1),
    }
}

fn snapshot() -> LedgerSnapshot {
    let trades = (1..=24)
        .map(|n| {
            if n % 2 == 0 {
                trade(n, "trend", if n % 3 == 0 { dec!(-40) } else { dec!(90) })
            } else {
                trade(n, "carry", if n % 4 == 1 { dec!(60) } else { dec!(-30) })
            }
        })
        .collect();

    LedgerSnapshot {
        layer_id: "core".into(),
        trades,
        skipped_records: 0,
        layer_equity: curve(|i| Decimal::from(100_000 + 500 * i - if i % 3 == 0 { 800 } else { 0 })),
        amp_equity: BTreeMap::from([
            (AmpId::from("trend"), curve(|i| Decimal::from(50_000 + 300 * i + (i % 4) * 100))),
            (AmpId::from("carry"), curve(|i| Decimal::from(50_000 + 200 * i - (i % 5) * 150))),
        ]),
        roster: vec![
            AmpMeta {
                amp_id: "trend".into(),
                amp_name: "Trend".to_string(),
                signals_generated: 20,
            },
            AmpMeta {
                amp_id: "carry".into(),
                amp_name: "Carry".to_string(),
                signals_generated: 12,
            },
        ],
    }
}

fn assembler() -> ReportAssembler {
    ReportAssembler::new(&AnalyticsConfig::default()).unwrap()
}

#[tokio::test]
async fn assembles_a_complete_layer_report() {
    let report = assembler().assemble(snapshot()).await.unwrap();

    let metrics = report.metrics.metrics().expect("enough data for a full snapshot");
    assert_eq!(metrics.trades.total_trades, 24);
    assert_eq!(metrics.daily_points, DAYS as usize);
    assert!(metrics.max_drawdown <= 0.0);
    assert!((0.0..=1.0).contains(&metrics.trades.win_rate));

    assert_eq!(report.attribution.len(), 2);
    let amp_total: Decimal = report.attribution.iter().map(|a| a.total_pnl).sum();
    assert_eq!(amp_total, metrics.trades.net_pnl);
    let carry = report.attribution.iter().find(|a| a.amp_id.as_str() == "carry").unwrap();
    assert_eq!(carry.execution_rate, Some(1.0));

    assert_eq!(report.correlation.amp_ids.len(), 2);
    assert_eq!(report.correlation.values[0][1], report.correlation.values[1][0]);
    assert!((0.0..=100.0).contains(&report.correlation.diversification_score));

    assert_eq!(report.last_trade_id, Some(Uuid::from_u128(24)));
    assert!(report.diagnostics.amps_without_equity.is_empty());
    assert!(!report.is_incomplete());
}

#[tokio::test]
async fn assembling_twice_gives_the_same_report() {
    let first = assembler().assemble(snapshot()).await.unwrap();
    let second = assembler().assemble(snapshot()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn thin_layer_reports_insufficient_data_instead_of_failing() {
    let thin = LedgerSnapshot {
        layer_id: "core".into(),
        trades: vec![trade(1, "solo", dec!(12))],
        skipped_records: 2,
        roster: vec![AmpMeta {
            amp_id: "solo".into(),
            amp_name: "Solo".to_string(),
            signals_generated: 1,
        }],
        ..Default::default()
    };
    let report = assembler().assemble(thin).await.unwrap();

    match &report.metrics {
        MetricsOutcome::InsufficientData(data) => {
            assert_eq!(data.reason, InsufficiencyReason::TooFewTrades);
            assert_eq!(data.trades.total_trades, 1);
        }
        other => panic!("expected insufficient data, got {other:?}"),
    }
    assert!(report.is_incomplete());
    assert_eq!(report.diagnostics.skipped_records, 2);
    assert_eq!(report.diagnostics.amps_without_equity, vec![AmpId::from("solo")]);
    assert!(report.correlation.has_flag(CorrelationFlag::InsufficientAmps));
    assert!(report.recommendations.iter().any(|r| r.rule_id == "insufficient_amps"));
}

#[tokio::test]
async fn wiped_out_equity_is_kept_as_a_full_drawdown() {
    let mut snap = snapshot();
    snap.layer_equity[5].equity_value = dec!(0);
    snap.layer_equity[9].equity_value = dec!(-10);
    let report = assembler().assemble(snap).await.unwrap();

    let metrics = report.metrics.metrics().unwrap();
    assert!(metrics.max_drawdown <= -1.0);
    assert!(metrics.has_flag(MetricFlag::UnanchoredReturns));
    assert_eq!(metrics.daily_points, DAYS as usize);
    assert_eq!(report.diagnostics.skipped_equity_points, 0);
}

#[tokio::test]
async fn report_serializes_as_tagged_json() {
    let report = assembler().assemble(snapshot()).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["layer_id"], "core");
    assert_eq!(json["metrics"]["status"], "computed");
    assert!(json["correlation"]["values"].is_array());
    assert!(json["recommendations"].is_array());
}

#[tokio::test]
async fn assembles_many_layers_and_isolates_failures() {
    let mut ledger = InMemoryLedger::default();
    ledger.insert(snapshot());
    ledger.insert(LedgerSnapshot {
        layer_id: "empty".into(),
        ..Default::default()
    });

    let ids = vec![LayerId::from("core"), LayerId::from("missing"), LayerId::from("empty")];
    let results = assembler().assemble_layers(&ledger, &ids).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].0.as_str(), "core");
    assert!(results[0].1.is_ok());
    assert!(matches!(results[1].1, Err(ReportError::UnknownLayer(_))));
    let empty = results[2].1.as_ref().unwrap();
    assert!(empty.metrics.is_insufficient());
    assert!(empty.attribution.is_empty());
}
