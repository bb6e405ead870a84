//! Property-based tests for the thumbnail stores.
//!
//! Every property runs against both the SQLite store (in-memory database)
//! and the in-process store:
//! - Round trip: put(r) then get(r.tab_id) returns r
//! - Last write wins: two puts for one tab leave one record, the latest
//! - Prune keeps exactly the max_count most recently captured records
//! - delete_expired removes exactly the records past the TTL, then nothing
//! - get_many returns only the present tabs

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use tokio::runtime::Runtime;

use tab_thumbnails::store::epoch_ms;
use tab_thumbnails::{
    MemoryThumbnailStore, SqliteThumbnailStore, StoredThumbnail, TabId, ThumbnailStore,
};

const HOUR_MS: i64 = 60 * 60 * 1000;

// ============================================================================
// Helpers
// ============================================================================

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

async fn stores() -> Vec<Arc<dyn ThumbnailStore>> {
    let stores: Vec<Arc<dyn ThumbnailStore>> = vec![
        Arc::new(SqliteThumbnailStore::in_memory()),
        Arc::new(MemoryThumbnailStore::new()),
    ];
    for store in &stores {
        store.init().await.unwrap();
    }
    stores
}

// ============================================================================
// Strategies
// ============================================================================

fn arb_tab() -> impl Strategy<Value = i64> {
    1i64..10_000
}

fn arb_data_url() -> impl Strategy<Value = String> {
    "[A-Za-z0-9+/]{1,64}".prop_map(|payload| format!("data:image/jpeg;base64,{payload}"))
}

fn arb_record() -> impl Strategy<Value = StoredThumbnail> {
    (arb_tab(), arb_data_url(), 0i64..i64::MAX / 2)
        .prop_map(|(tab, url, at)| StoredThumbnail::at(TabId::new(tab), url, at))
}

/// Distinct tab IDs, each either well inside or well past a one-hour TTL.
fn arb_aged_tabs() -> impl Strategy<Value = BTreeMap<i64, bool>> {
    prop::collection::btree_map(arb_tab(), any::<bool>(), 0..40)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn put_then_get_round_trips(record in arb_record()) {
        runtime().block_on(async {
            for store in stores().await {
                store.put(record.clone()).await.unwrap();
                prop_assert_eq!(store.get(record.tab_id).await, Some(record.clone()));
            }
            Ok(())
        })?;
    }

    #[test]
    fn last_write_wins(first in arb_record(), url in arb_data_url(), at in 0i64..i64::MAX / 2) {
        runtime().block_on(async {
            let second = StoredThumbnail::at(first.tab_id, url.clone(), at);
            for store in stores().await {
                store.put(first.clone()).await.unwrap();
                store.put(second.clone()).await.unwrap();
                prop_assert_eq!(store.count().await, 1);
                prop_assert_eq!(store.get(first.tab_id).await, Some(second.clone()));
            }
            Ok(())
        })?;
    }

    #[test]
    fn prune_keeps_most_recent(total in 1usize..40, max_count in 0usize..40) {
        runtime().block_on(async {
            for store in stores().await {
                // Tab i captured at time i: larger tab IDs are newer.
                for i in 0..total {
                    let tab = i as i64 + 1;
                    store.put(StoredThumbnail::at(TabId::new(tab), "data:x", tab)).await.unwrap();
                }

                store.prune(max_count).await;

                let kept = total.min(max_count);
                prop_assert_eq!(store.count().await, kept);
                let all: Vec<TabId> = (1..=total as i64).map(TabId::new).collect();
                let present = store.get_many(&all).await;
                for tab in 1..=total as i64 {
                    let expect = tab > (total - kept) as i64;
                    prop_assert_eq!(present.contains_key(&TabId::new(tab)), expect);
                }
            }
            Ok(())
        })?;
    }

    #[test]
    fn delete_expired_removes_exactly_old(tabs in arb_aged_tabs()) {
        runtime().block_on(async {
            let now = epoch_ms();
            let expired = tabs.values().filter(|&&old| old).count();
            for store in stores().await {
                for (&tab, &old) in &tabs {
                    let age = if old { 2 * HOUR_MS } else { HOUR_MS / 12 };
                    store.put(StoredThumbnail::at(TabId::new(tab), "data:x", now - age)).await.unwrap();
                }

                let ttl = Duration::from_millis(HOUR_MS as u64);
                prop_assert_eq!(store.delete_expired(ttl).await, expired);
                prop_assert_eq!(store.delete_expired(ttl).await, 0);
                prop_assert_eq!(store.count().await, tabs.len() - expired);
            }
            Ok(())
        })?;
    }

    #[test]
    fn get_many_returns_only_present(
        present in prop::collection::btree_set(arb_tab(), 0..20),
        absent in prop::collection::btree_set(10_000i64..20_000, 0..20),
    ) {
        runtime().block_on(async {
            for store in stores().await {
                for &tab in &present {
                    store.put(StoredThumbnail::at(TabId::new(tab), format!("data:{tab}"), tab)).await.unwrap();
                }

                let query: Vec<TabId> = present.iter().chain(&absent).copied().map(TabId::new).collect();
                let found = store.get_many(&query).await;

                prop_assert_eq!(found.len(), present.len());
                for &tab in &present {
                    prop_assert_eq!(&found[&TabId::new(tab)].data_url, &format!("data:{tab}"));
                }
            }
            Ok(())
        })?;
    }
}
