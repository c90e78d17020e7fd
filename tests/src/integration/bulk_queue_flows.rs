//! # Bulk Queue Flows
//!
//! Queueing whole cache groups and topologies for one CDN, and the
//! revalidation channel that rides alongside configuration updates.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use tc_server_updates::{
        QueueAction, RevalPendingRequest, ScopedQueueRequest, ServerUpdateApi, UpdateError,
    };

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn scoped(action: &str, cdn_id: i64) -> ScopedQueueRequest {
        ScopedQueueRequest {
            action: action.to_string(),
            cdn_id,
        }
    }

    // =========================================================================
    // CACHE GROUP QUEUE
    // =========================================================================

    #[tokio::test]
    async fn test_cache_group_queue_limited_to_cdn() {
        let fixture = CdnFixture::new();

        let response = fixture
            .handler
            .post_cache_group_queue_update(EDGE_CG, scoped("queue", CDN1))
            .await;
        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.alerts[0].text,
            "Queued servers in cache group cachegroup1 (3)"
        );

        let result = response.response.unwrap();
        assert_eq!(result.cache_group_name, "cachegroup1");
        assert_eq!(result.cdn_id, CDN1);
        assert_eq!(
            result.server_names,
            vec!["atlanta-edge-01", "atlanta-edge-03", DUP_HOST]
        );

        assert!(fixture.status_of("atlanta-edge-01").await.update_pending);
        assert!(!fixture.status_of("atlanta-edge-14").await.update_pending);
        assert!(!fixture.status_of("atlanta-mid-01").await.update_pending);
    }

    #[tokio::test]
    async fn test_cache_group_dequeue_clears_members() {
        let fixture = CdnFixture::new();
        let service = fixture.service();
        service
            .queue_cache_group_updates(EDGE_CG, CDN1, QueueAction::Queue)
            .await
            .unwrap();

        let done = service
            .queue_cache_group_updates(EDGE_CG, CDN1, QueueAction::Dequeue)
            .await
            .unwrap();
        assert_eq!(done.action, QueueAction::Dequeue);

        for host in UNIQUE_HOSTS {
            assert!(!fixture.status_of(host).await.update_pending, "{host}");
        }
    }

    #[tokio::test]
    async fn test_cache_group_queue_without_servers_in_cdn() {
        let fixture = CdnFixture::new();
        let done = fixture
            .service()
            .queue_cache_group_updates(SIBLING_CG, CDN2, QueueAction::Queue)
            .await
            .unwrap();

        assert!(done.server_names.is_empty());
        assert!(!fixture.status_of("atlanta-edge-16").await.update_pending);
    }

    #[tokio::test]
    async fn test_cache_group_queue_errors() {
        let fixture = CdnFixture::new();

        let missing = fixture
            .handler
            .post_cache_group_queue_update(999, scoped("queue", CDN1))
            .await;
        assert_eq!(missing.status_code, 404);

        let bad_action = fixture
            .handler
            .post_cache_group_queue_update(EDGE_CG, scoped("flush", CDN1))
            .await;
        assert_eq!(bad_action.status_code, 400);
    }

    // =========================================================================
    // TOPOLOGY QUEUE
    // =========================================================================

    #[tokio::test]
    async fn test_topology_queue_covers_every_member_group() {
        let fixture = CdnFixture::new();

        let response = fixture
            .handler
            .post_topology_queue_update(TOPOLOGY, scoped("queue", CDN1))
            .await;
        assert_eq!(response.status_code, 200);
        let result = response.response.unwrap();
        assert_eq!(result.topology, TOPOLOGY);
        assert_eq!(result.server_names.len(), 6);
        assert_eq!(
            response.alerts[0].text,
            format!("Queued servers in topology {TOPOLOGY} (6)")
        );

        for host in [
            "atlanta-mid-01",
            "atlanta-mid-16",
            "atlanta-edge-01",
            "atlanta-edge-03",
            "atlanta-edge-16",
        ] {
            assert!(fixture.status_of(host).await.update_pending, "{host}");
        }

        // Legacy-only group and other CDN are outside the topology scope
        assert!(!fixture.status_of("denver-edge-01").await.update_pending);
        assert!(!fixture.status_of("atlanta-edge-14").await.update_pending);
    }

    #[tokio::test]
    async fn test_unknown_topology_is_not_found() {
        let fixture = CdnFixture::new();
        let err = fixture
            .service()
            .queue_topology_updates("no-such-topology", CDN1, QueueAction::Queue)
            .await
            .unwrap_err();

        assert_eq!(err, UpdateError::TopologyNotFound("no-such-topology".to_string()));
    }

    // =========================================================================
    // REVALIDATION
    // =========================================================================

    #[tokio::test]
    async fn test_reval_pending_is_independent_of_config_updates() {
        let fixture = CdnFixture::new();

        let response = fixture
            .handler
            .post_reval_pending(MID_01, RevalPendingRequest { reval_pending: true })
            .await;
        assert_eq!(response.status_code, 200);

        let mid = fixture.status_of("atlanta-mid-01").await;
        assert!(mid.reval_pending);
        assert!(!mid.update_pending);

        let edge = fixture.status_of("atlanta-edge-01").await;
        assert!(!edge.reval_pending);
        assert!(edge.parent_reval_pending);
        assert!(!edge.parent_pending);

        assert!(!fixture.status_of("atlanta-edge-16").await.parent_reval_pending);
    }

    #[tokio::test]
    async fn test_reval_clear_and_unknown_server() {
        let fixture = CdnFixture::new();
        let service = fixture.service();
        service.set_reval_pending(EDGE_01, true).await.unwrap();

        let cleared = service.set_reval_pending(EDGE_01, false).await.unwrap();
        assert!(!cleared.reval_pending());

        let missing = fixture
            .handler
            .post_reval_pending(-1, RevalPendingRequest { reval_pending: true })
            .await;
        assert_eq!(missing.status_code, 404);
    }
}
