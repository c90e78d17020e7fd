//! # Concurrent Writers
//!
//! Many operators and caches hit the same inventory at once. Commits are
//! copy-on-write with per-server revisions, so contended writers replan
//! instead of clobbering each other and readers always see whole commits.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use std::sync::Arc;
    use tc_server_updates::{ServerStatus, ServerUpdateApi, UpdateStatusConfig};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    /// Retries never run out: a writer only loses a race to another writer
    /// that then finishes, so `tasks - 1` conflicts is the worst case.
    fn contended_fixture(tasks: u32) -> Arc<CdnFixture> {
        Arc::new(CdnFixture::with_config(UpdateStatusConfig {
            max_commit_retries: tasks,
            ..UpdateStatusConfig::for_testing()
        }))
    }

    // =========================================================================
    // DISJOINT WRITERS
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_queues_on_distinct_servers_all_land() {
        let fixture = contended_fixture(8);
        let ids = [MID_01, MID_16, EDGE_01, EDGE_03, EDGE_14_CDN2, SIBLING_EDGE, LEGACY_EDGE];

        let mut handles = Vec::new();
        for id in ids {
            let fixture = fixture.clone();
            handles.push(tokio::spawn(async move {
                fixture.service().set_queue_update(id, true).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for host in UNIQUE_HOSTS {
            assert!(fixture.status_of(host).await.update_pending, "{host}");
        }
    }

    // =========================================================================
    // CONTENDED WRITERS
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_status_changes_race_with_descendant_queues() {
        let fixture = contended_fixture(16);

        let mut handles = Vec::new();
        for round in 0..8 {
            let writer = fixture.clone();
            handles.push(tokio::spawn(async move {
                writer
                    .service()
                    .set_server_status(MID_01, "OFFLINE".into(), Some(format!("round {round}")))
                    .await
                    .map(|_| ())
            }));
            let queuer = fixture.clone();
            handles.push(tokio::spawn(async move {
                queuer
                    .service()
                    .set_queue_update(EDGE_01, true)
                    .await
                    .map(|_| ())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mid = fixture.server(MID_01);
        assert_eq!(mid.status, ServerStatus::Offline);
        assert!(!mid.update_pending());
        assert!(fixture.status_of("atlanta-edge-01").await.update_pending);
        assert!(fixture.status_of("atlanta-edge-03").await.update_pending);
        assert!(!fixture.status_of("atlanta-edge-16").await.update_pending);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_revision_advances_once_per_commit() {
        let fixture = contended_fixture(8);
        let before = fixture.server(EDGE_01).revision;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let fixture = fixture.clone();
            handles.push(tokio::spawn(async move {
                fixture.service().set_reval_pending(EDGE_01, true).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(fixture.server(EDGE_01).revision, before + 8);
        assert!(fixture.status_of("atlanta-edge-01").await.reval_pending);
    }

    // =========================================================================
    // READERS DURING WRITES
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_never_see_partial_cascade() {
        let fixture = contended_fixture(4);

        let reader = {
            let fixture = fixture.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    let snapshot = fixture.store.current();
                    let edge_01 = snapshot.server(EDGE_01).unwrap().update_pending();
                    let edge_03 = snapshot.server(EDGE_03).unwrap().update_pending();
                    let legacy = snapshot.server(LEGACY_EDGE).unwrap().update_pending();
                    assert_eq!(edge_01, edge_03);
                    assert_eq!(edge_01, legacy);
                    tokio::task::yield_now().await;
                }
            })
        };

        fixture
            .service()
            .set_server_status(MID_01, "ADMIN_DOWN".into(), Some("swap".to_string()))
            .await
            .unwrap();
        reader.await.unwrap();

        assert!(fixture.status_of("denver-edge-01").await.update_pending);
    }
}
