//! # Apply-Time Flows
//!
//! A cache polls its update status, applies configuration, then reports the
//! apply time back. The pending flag clears only when the reported apply
//! time has caught up with the latest queue.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use chrono::Duration;
    use tc_server_updates::{ServerUpdateApi, UpdateError, UpdateTimesReport};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn config_applied_at(offset_secs: i64) -> UpdateTimesReport {
        UpdateTimesReport {
            config_apply_time: Some(start_time() + Duration::seconds(offset_secs)),
            ..Default::default()
        }
    }

    async fn queued_edge() -> CdnFixture {
        let fixture = CdnFixture::new();
        fixture
            .service()
            .set_queue_update(EDGE_01, true)
            .await
            .unwrap();
        assert!(fixture.status_of("atlanta-edge-01").await.update_pending);
        fixture
    }

    // =========================================================================
    // CONFIG APPLY
    // =========================================================================

    #[tokio::test]
    async fn test_apply_after_queue_clears_pending() {
        let fixture = queued_edge().await;

        let response = fixture
            .handler
            .post_update_times("atlanta-edge-01", config_applied_at(30))
            .await;
        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.alerts[0].text,
            "successfully set server 'atlanta-edge-01' update times"
        );

        let status = fixture.status_of("atlanta-edge-01").await;
        assert!(!status.update_pending);
        assert_eq!(status.config_apply_time, start_time() + Duration::seconds(30));
    }

    #[tokio::test]
    async fn test_apply_at_queue_time_clears_pending() {
        let fixture = queued_edge().await;
        fixture
            .service()
            .set_update_times("atlanta-edge-01", config_applied_at(0))
            .await
            .unwrap();

        assert!(!fixture.status_of("atlanta-edge-01").await.update_pending);
    }

    #[tokio::test]
    async fn test_stale_apply_keeps_pending() {
        let fixture = queued_edge().await;
        fixture
            .service()
            .set_update_times("atlanta-edge-01", config_applied_at(-60))
            .await
            .unwrap();

        assert!(fixture.status_of("atlanta-edge-01").await.update_pending);
    }

    #[tokio::test]
    async fn test_queue_after_apply_with_lagging_clock_is_pending() {
        let fixture = CdnFixture::new();
        let service = fixture.service();
        service
            .set_update_times("atlanta-edge-01", config_applied_at(3_600))
            .await
            .unwrap();

        // Clock still at start_time, an hour behind the reported apply time
        service.set_queue_update(EDGE_01, true).await.unwrap();

        let status = fixture.status_of("atlanta-edge-01").await;
        assert!(status.update_pending);
        assert!(status.config_update_time > status.config_apply_time);
    }

    #[tokio::test]
    async fn test_reval_apply_clears_reval_only() {
        let fixture = queued_edge().await;
        let service = fixture.service();
        service.set_reval_pending(EDGE_01, true).await.unwrap();

        service
            .set_update_times(
                "atlanta-edge-01",
                UpdateTimesReport {
                    reval_apply_time: Some(start_time() + Duration::seconds(5)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let status = fixture.status_of("atlanta-edge-01").await;
        assert!(!status.reval_pending);
        assert!(status.update_pending);
    }

    // =========================================================================
    // FAILURE FLAGS
    // =========================================================================

    #[tokio::test]
    async fn test_failure_flags_recorded_without_apply_time() {
        let fixture = queued_edge().await;
        fixture
            .service()
            .set_update_times(
                "atlanta-edge-01",
                UpdateTimesReport {
                    config_update_failed: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let status = fixture.status_of("atlanta-edge-01").await;
        assert!(status.config_update_failed);
        assert!(!status.reval_update_failed);
        assert!(status.update_pending);
    }

    // =========================================================================
    // ERRORS AND DUPLICATES
    // =========================================================================

    #[tokio::test]
    async fn test_empty_report_is_rejected() {
        let fixture = CdnFixture::new();

        let response = fixture
            .handler
            .post_update_times("atlanta-edge-01", UpdateTimesReport::default())
            .await;
        assert_eq!(response.status_code, 400);

        let err = fixture
            .service()
            .set_update_times("atlanta-edge-01", UpdateTimesReport::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UpdateError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_host_is_not_found() {
        let fixture = CdnFixture::new();
        let response = fixture
            .handler
            .post_update_times("ghost-edge", config_applied_at(1))
            .await;

        assert_eq!(response.status_code, 404);
    }

    #[tokio::test]
    async fn test_report_applies_to_every_server_with_hostname() {
        let fixture = CdnFixture::new();
        let service = fixture.service();
        service.set_queue_update(DUP_CDN1, true).await.unwrap();
        service.set_queue_update(DUP_CDN2, true).await.unwrap();

        let updated = service
            .set_update_times(DUP_HOST, config_applied_at(10))
            .await
            .unwrap();
        assert_eq!(updated.len(), 2);

        let entries = service.get_server_update_status(DUP_HOST).await.unwrap();
        assert!(entries.iter().all(|e| !e.update_pending));
    }

    #[tokio::test]
    async fn test_report_parsed_from_json() {
        let report: UpdateTimesReport = serde_json::from_value(serde_json::json!({
            "configApplyTime": "2023-11-14T22:13:30Z",
            "revalUpdateFailed": false
        }))
        .unwrap();

        assert_eq!(report.config_apply_time, Some(start_time() + Duration::seconds(10)));
        assert_eq!(report.reval_update_failed, Some(false));
        assert!(report.reval_apply_time.is_none());
    }
}
