//! # Event Hub Flows
//!
//! Hub behavior end to end, from `Client` configuration to listener
//! delivery over mock delivery streams.
//!
//! ```text
//! MockDeliver feed ──→ Eventer ──→ EventHub ──┬──→ block listeners
//!                                             ├──→ transaction listeners
//!                                             └──→ chaincode listeners
//! ```

#[cfg(test)]
mod tests {
    use super::super::harness::{recorder, settle, Harness, Recorded};
    use fc_01_endpoint::DeliverFeed;
    use fc_03_event_hub::{
        Delivery, EventHub, EventNameMatch, ListenerOptions, StartRequest, TerminationKind,
    };
    use fc_client::ClientConfig;
    use proptest::prelude::*;
    use shared_types::test_utils::{filtered_block, full_block, TxFixture};
    use shared_types::{Block, BlockPosition, Status, TxValidationCode};

    // =========================================================================
    // FIXTURES
    // =========================================================================

    fn block_numbers(seen: &Recorded) -> Vec<u64> {
        seen.lock()
            .iter()
            .filter_map(Delivery::event)
            .filter(|e| !e.end_block_received)
            .map(|e| e.block_number.value())
            .collect()
    }

    fn terminations(seen: &Recorded) -> Vec<TerminationKind> {
        seen.lock()
            .iter()
            .filter_map(Delivery::termination)
            .map(|t| t.kind)
            .collect()
    }

    async fn feed_blocks(feed: &DeliverFeed, blocks: impl IntoIterator<Item = u64>) {
        for number in blocks {
            feed.filtered(filtered_block(number, &[]));
            settle().await;
        }
    }

    // =========================================================================
    // RANGE FILTERING
    // =========================================================================

    fn delivered_window(start: u64, end: u64) -> (Vec<u64>, Vec<u64>) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let harness = Harness::new(ClientConfig::default());
            let hub = harness.hub(StartRequest::default());
            let (callback, seen) = recorder();
            hub.register_block_listener(
                ListenerOptions::default().starting_at(start).ending_at(end),
                callback,
            )
            .unwrap();

            let feed = harness
                .start(&hub, "peer0.org1:7053", |feed| {
                    feed.filtered(filtered_block(1, &[]));
                })
                .await;
            feed_blocks(&feed, 2..=20).await;

            let end_events: Vec<u64> = seen
                .lock()
                .iter()
                .filter_map(Delivery::event)
                .filter(|e| e.end_block_received)
                .map(|e| e.block_number.value())
                .collect();
            (block_numbers(&seen), end_events)
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_listener_sees_exactly_its_window(start in 1u64..=20, len in 0u64..20) {
            let end = (start + len).min(20);
            let (numbers, end_events) = delivered_window(start, end);
            prop_assert_eq!(numbers, (start..=end).collect::<Vec<_>>());
            prop_assert_eq!(end_events, vec![end]);
        }
    }

    #[tokio::test]
    async fn test_unbounded_listener_sees_everything() {
        let harness = Harness::new(ClientConfig::default());
        let hub = harness.hub(StartRequest::default());
        let (callback, seen) = recorder();
        hub.register_block_listener(ListenerOptions::default().starting_at(3u64), callback)
            .unwrap();

        let feed = harness
            .start(&hub, "peer0.org1:7053", |feed| {
                feed.filtered(filtered_block(1, &[]));
            })
            .await;
        feed_blocks(&feed, 2..=6).await;

        assert_eq!(block_numbers(&seen), vec![3, 4, 5, 6]);
        assert_eq!(hub.listener_count(), 1);
    }

    // =========================================================================
    // STREAM OWNERSHIP AND SHUTDOWN
    // =========================================================================

    #[tokio::test]
    async fn test_second_send_replaces_stream_without_duplicates() {
        let harness = Harness::new(ClientConfig::default());
        let hub = harness.hub(StartRequest::default());
        let (callback, seen) = recorder();
        hub.register_block_listener(ListenerOptions::default(), callback)
            .unwrap();

        let first = harness
            .start(&hub, "peer0.org1:7053", |feed| {
                feed.filtered(filtered_block(1, &[]));
            })
            .await;
        feed_blocks(&first, [2]).await;

        let second = harness
            .start(&hub, "peer1.org1:7053", |feed| {
                feed.filtered(filtered_block(3, &[]));
            })
            .await;

        // Both streams keep producing; only the newer one counts.
        first.filtered(filtered_block(3, &[]));
        first.filtered(filtered_block(4, &[]));
        second.filtered(filtered_block(4, &[]));
        settle().await;

        assert_eq!(block_numbers(&seen), vec![1, 2, 3, 4]);
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(hub.is_listening());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_close_notifies_each_listener_once() {
        let harness = Harness::new(ClientConfig::default());
        let hub = harness.hub(StartRequest::default());
        let (block_cb, blocks) = recorder();
        let (tx_cb, txs) = recorder();
        let (cc_cb, ccs) = recorder();
        hub.register_block_listener(ListenerOptions::default(), block_cb)
            .unwrap();
        hub.register_transaction_listener("all", ListenerOptions::default(), tx_cb)
            .unwrap();
        hub.register_chaincode_listener("mycc", EventNameMatch::exact("moved"), ListenerOptions::default(), cc_cb)
            .unwrap();

        let feed = harness
            .start(&hub, "peer0.org1:7053", |feed| {
                feed.filtered(filtered_block(1, &[]));
            })
            .await;

        let closers: Vec<_> = (0..4)
            .map(|_| {
                let hub: EventHub = hub.clone();
                tokio::spawn(async move { hub.close() })
            })
            .collect();
        feed.error("connection reset");
        for joined in futures::future::join_all(closers).await {
            joined.unwrap();
        }
        hub.close();
        settle().await;

        for seen in [&blocks, &txs, &ccs] {
            assert_eq!(terminations(seen).len(), 1);
        }
        assert_eq!(hub.listener_count(), 0);
        assert!(!hub.is_listening());
    }

    #[tokio::test]
    async fn test_hub_end_block_shuts_everything_down() {
        let harness = Harness::new(ClientConfig::default());
        let hub = harness.hub(StartRequest {
            start_block: Some(1u64.into()),
            end_block: Some(10u64.into()),
            block_type: None,
        });
        let (block_cb, blocks) = recorder();
        let (tx_cb, txs) = recorder();
        let (cc_cb, ccs) = recorder();
        hub.register_block_listener(ListenerOptions::default(), block_cb)
            .unwrap();
        hub.register_transaction_listener("all", ListenerOptions::default(), tx_cb)
            .unwrap();
        hub.register_chaincode_listener(
            "mycc",
            EventNameMatch::pattern("^moved").unwrap(),
            ListenerOptions::default(),
            cc_cb,
        )
        .unwrap();

        let feed = harness
            .start(&hub, "peer0.org1:7053", |feed| {
                feed.filtered(filtered_block(1, &[]));
            })
            .await;
        feed_blocks(&feed, 2..=10).await;

        assert_eq!(block_numbers(&blocks), (1..=10).collect::<Vec<_>>());
        for seen in [&blocks, &txs, &ccs] {
            assert_eq!(terminations(seen), vec![TerminationKind::EndBlockReached]);
        }
        assert!(hub.end_block_seen());
        assert!(!hub.is_listening());
        settle().await;
        assert!(feed.is_cancelled());
    }

    #[tokio::test]
    async fn test_success_status_before_end_block_is_unexpected() {
        let harness = Harness::new(ClientConfig::default());
        let hub = harness.hub(StartRequest {
            start_block: Some(1u64.into()),
            end_block: Some(10u64.into()),
            block_type: None,
        });
        let (callback, seen) = recorder();
        hub.register_block_listener(ListenerOptions::default(), callback)
            .unwrap();

        let feed = harness
            .start(&hub, "peer0.org1:7053", |feed| {
                feed.filtered(filtered_block(1, &[]));
            })
            .await;
        feed.status(Status::Success);
        settle().await;

        assert_eq!(block_numbers(&seen), vec![1]);
        assert_eq!(terminations(&seen), vec![TerminationKind::UnexpectedStatus]);
        assert!(!hub.end_block_seen());
        assert!(!hub.is_listening());
    }

    #[tokio::test]
    async fn test_undecodable_block_terminates_listeners() {
        let harness = Harness::new(ClientConfig::default());
        let hub = harness.hub(StartRequest {
            block_type: Some(shared_types::BlockType::Full),
            ..Default::default()
        });
        let (callback, seen) = recorder();
        hub.register_transaction_listener("tx1", ListenerOptions::default(), callback)
            .unwrap();

        let mut broken = Block::default();
        broken.header.number = 2;
        broken.data.data.push(vec![0xff, 0x01]);
        let feed = harness
            .start(&hub, "peer0.org1:7053", move |feed| {
                feed.block(broken);
            })
            .await;
        settle().await;

        assert_eq!(terminations(&seen), vec![TerminationKind::DecodeError]);
        assert_eq!(hub.listener_count(), 0);
        assert!(!hub.is_listening());
        settle().await;
        assert!(feed.is_cancelled());
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    #[tokio::test]
    async fn test_chaincode_events_batched_per_block() {
        let harness = Harness::new(ClientConfig::default());
        let hub = harness.hub(StartRequest {
            block_type: Some(shared_types::BlockType::Full),
            ..Default::default()
        });
        let (_, mut rx) = hub
            .subscribe_chaincode("mycc", EventNameMatch::pattern("^asset").unwrap(), ListenerOptions::default())
            .unwrap();

        let block = full_block(
            1,
            &[
                TxFixture::endorser("tx1", "mycc")
                    .with_event("assetCreated", b"1")
                    .with_event("assetMoved", b"2"),
                TxFixture::endorser("tx2", "mycc").with_event("audit", b"x"),
                TxFixture::endorser("tx3", "mycc").with_event("assetDeleted", b"3"),
                TxFixture::config("tx4"),
            ],
        );
        let _feed = harness
            .start(&hub, "peer0.org1:7053", move |feed| {
                feed.block(block);
            })
            .await;
        settle().await;

        let event = rx.try_recv().unwrap().into_result().unwrap();
        let names: Vec<_> = event
            .chaincode_events
            .iter()
            .map(|e| e.event_name.as_str())
            .collect();
        assert_eq!(names, vec!["assetCreated", "assetMoved", "assetDeleted"]);
        assert_eq!(event.chaincode_events[1].payload, b"2".to_vec());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_transaction_listener_gets_validation_label() {
        let harness = Harness::new(ClientConfig::default());
        let hub = harness.hub(StartRequest::default());
        let (_, mut rx) = hub
            .subscribe_transaction("tx2", ListenerOptions::default())
            .unwrap();

        let invalid = TxValidationCode::MvccReadConflict;
        let _feed = harness
            .start(&hub, "peer0.org1:7053", move |feed| {
                feed.filtered(filtered_block(
                    1,
                    &[
                        TxFixture::endorser("tx1", "mycc"),
                        TxFixture::endorser("tx2", "mycc").with_code(invalid.code() as u8),
                    ],
                ));
            })
            .await;

        let event = rx.try_recv().unwrap().into_result().unwrap();
        assert_eq!(event.transaction_id.as_deref(), Some("tx2"));
        assert_eq!(event.transaction_status.as_deref(), Some(invalid.as_str()));
        // Specific transaction ids unregister after the first match.
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_validation_codes_round_trip() {
        let mut labels = std::collections::HashSet::new();
        for code in TxValidationCode::ALL {
            let label = code.as_str();
            assert!(labels.insert(label), "duplicate label {label}");
            assert_eq!(label.parse::<TxValidationCode>().unwrap(), *code);
            assert_eq!(TxValidationCode::from_code(code.code()), Some(*code));
        }
    }

    #[tokio::test]
    async fn test_send_after_shutdown_restarts() {
        let harness = Harness::new(ClientConfig::default());
        let hub = harness.hub(StartRequest::default());
        let feed = harness
            .start(&hub, "peer0.org1:7053", |feed| {
                feed.filtered(filtered_block(1, &[]));
            })
            .await;
        feed.end();
        settle().await;
        assert!(!hub.is_listening());

        let (_, mut rx) = hub.subscribe_blocks(ListenerOptions::default()).unwrap();
        let _again = harness
            .start(&hub, "peer1.org1:7053", |feed| {
                feed.filtered(filtered_block(2, &[]));
            })
            .await;

        let event = rx.try_recv().unwrap().into_result().unwrap();
        assert_eq!(event.block_number.value(), 2);
        assert!(hub.is_listening());
    }

    #[test]
    fn test_start_positions_accept_sentinels() {
        let harness = Harness::new(ClientConfig::default());
        let hub = harness.client.event_hub("hub", "mychannel").unwrap();
        hub.build(
            harness.identity.as_ref(),
            StartRequest {
                start_block: Some(BlockPosition::Oldest),
                end_block: Some(BlockPosition::Newest),
                block_type: None,
            },
        )
        .unwrap();
        assert!(hub.payload_bytes().is_ok());
    }
}
