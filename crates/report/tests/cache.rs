use chrono::{TimeZone, Utc};
use configuration::{AnalyticsConfig, CacheSettings};
use core_types::{LayerId, OrderSide, Trade};
use report::{CacheKey, InMemoryLedger, LayerReport, LedgerSnapshot, ReportAssembler, SnapshotCache};
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn settings(ttl_secs: u64, capacity: usize) -> CacheSettings {
    CacheSettings {
        ttl: Duration::from_secs(ttl_secs),
        capacity,
    }
}

fn key(layer: &str, last: u128) -> CacheKey {
    CacheKey {
        layer_id: layer.into(),
        last_trade_id: Some(Uuid::from_u128(last)),
    }
}

async fn empty_report(layer: &str) -> Arc<LayerReport> {
    let snapshot = LedgerSnapshot {
        layer_id: layer.into(),
        ..Default::default()
    };
    Arc::new(ReportAssembler::new(&AnalyticsConfig::default()).unwrap().assemble(snapshot).await.unwrap())
}

fn trade(n: u128) -> Trade {
    let entry = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(n as i64);
    Trade {
        trade_id: Uuid::from_u128(n),
        amp_id: "amp".into(),
        layer_id: "core".into(),
        symbol: "ETHUSDT".to_string(),
        side: OrderSide::Sell,
        entry_time: entry,
        exit_time: entry + chrono::Duration::minutes(20),
        entry_price: dec!(3000),
        exit_price: dec!(2990),
        quantity: dec!(1),
        realized_pnl: dec!(10),
        fees: dec!(0.5),
    }
}

#[tokio::test]
async fn second_lookup_is_served_from_the_cache() {
    let cache = SnapshotCache::new(&settings(300, 8));
    let report = empty_report("core").await;
    let calls = AtomicUsize::new(0);

    for _ in 0..3 {
        let cached = cache
            .get_or_compute(key("core", 1), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok((*report).clone())
            })
            .await
            .unwrap();
        assert_eq!(cached.layer_id.as_str(), "core");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn entries_expire_after_the_ttl() {
    let cache = SnapshotCache::new(&settings(60, 8));
    cache.insert(key("core", 1), empty_report("core").await).await;

    tokio::time::advance(Duration::from_secs(59)).await;
    assert!(cache.get(&key("core", 1)).await.is_some());

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(cache.get(&key("core", 1)).await.is_none());
    assert!(cache.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn oldest_entry_is_evicted_at_capacity() {
    let cache = SnapshotCache::new(&settings(300, 2));
    for n in 1..=3 {
        cache.insert(key("core", n), empty_report("core").await).await;
        tokio::time::advance(Duration::from_secs(1)).await;
    }

    assert_eq!(cache.len().await, 2);
    assert!(cache.get(&key("core", 1)).await.is_none());
    assert!(cache.get(&key("core", 3)).await.is_some());
}

#[tokio::test]
async fn invalidation_only_touches_the_given_layer() {
    let cache = SnapshotCache::new(&settings(300, 8));
    cache.insert(key("core", 1), empty_report("core").await).await;
    cache.insert(key("core", 2), empty_report("core").await).await;
    cache.insert(key("satellite", 1), empty_report("satellite").await).await;

    assert_eq!(cache.invalidate_layer(&LayerId::from("core")).await, 2);
    assert_eq!(cache.len().await, 1);
    assert!(cache.get(&key("satellite", 1)).await.is_some());
}

#[tokio::test]
async fn a_newly_settled_trade_changes_the_cache_key() {
    let assembler = ReportAssembler::new(&AnalyticsConfig::default()).unwrap();
    let cache = SnapshotCache::new(&settings(300, 8));
    let layer = LayerId::from("core");

    let mut ledger = InMemoryLedger::default();
    ledger.insert(LedgerSnapshot {
        layer_id: layer.clone(),
        trades: vec![trade(1), trade(2)],
        ..Default::default()
    });

    let first = assembler.report_cached(&cache, &ledger, &layer).await.unwrap();
    let again = assembler.report_cached(&cache, &ledger, &layer).await.unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(first.last_trade_id, Some(Uuid::from_u128(2)));

    ledger.insert(LedgerSnapshot {
        layer_id: layer.clone(),
        trades: vec![trade(1), trade(2), trade(3)],
        ..Default::default()
    });
    let updated = assembler.report_cached(&cache, &ledger, &layer).await.unwrap();
    assert!(!Arc::ptr_eq(&first, &updated));
    assert_eq!(updated.last_trade_id, Some(Uuid::from_u128(3)));
    assert_eq!(updated.metrics.trade_stats().total_trades, 3);
    assert_eq!(cache.len().await, 2);
}
