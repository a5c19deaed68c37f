//! # Gossip Scenarios
//!
//! End-to-end behaviour of statement distribution:
//!
//! 1. **Relay and reply**: duplicate `Seconded` is stored once, peers get
//!    exactly the statements they are missing, `Seconded` first.
//! 2. **Equivocation**: a validator seconding three candidates.
//! 3. **View teardown**: leaving a relay-parent releases everything.
//! 4. **Dependency race**: both the drop and the retain policy.
//! 5. **Catch-up**: a peer joining late gets the full history in order.

#[cfg(test)]
mod tests {
    use qc_05_statement_distribution::domain::reputation::{
        BENEFIT_VALID_STATEMENT_FIRST, COST_EQUIVOCATION,
    };
    use qc_05_statement_distribution::events::NeighborPacket;
    use qc_05_statement_distribution::test_utils::*;
    use qc_05_statement_distribution::{
        DependencyRacePolicy, DistributionConfig, DistributionError, StatementDistributionApi,
        View,
    };
    use shared_types::{Hash, SignedStatement};

    const RP: Hash = [0xA1; 32];
    const X: u32 = 0;
    const Y: u32 = 1;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn setup(config: DistributionConfig) -> TestHarness {
        init_tracing();
        let h = TestHarness::new(config, 4);
        h.service.set_own_view(View::new([RP]));
        h
    }

    fn join(h: &TestHarness, peer_n: u8, relay_parents: Vec<Hash>) {
        h.service.peer_connected(peer(peer_n));
        h.service
            .handle_neighbor_packet(peer(peer_n), NeighborPacket { relay_parents });
    }

    fn assert_no_repeats(sent: &[SignedStatement]) {
        for (i, statement) in sent.iter().enumerate() {
            assert!(
                !sent[i + 1..].contains(statement),
                "statement sent twice to the same peer"
            );
        }
    }

    // =============================================================================
    // SCENARIO 1: RELAY AND REPLY
    // =============================================================================

    #[test]
    fn test_relay_and_reply_sends_only_missing_statements() {
        let h = setup(DistributionConfig::default());
        let (a, b, c) = (peer(0xA), peer(0xB), peer(0xC));
        join(&h, 0xA, vec![RP]);
        join(&h, 0xC, vec![RP]);
        // B never declares the relay-parent, so nothing is sent to it.
        h.service.peer_connected(b);

        let seconded_m = seconded(&RP, X, 1);
        let valid_m = valid(&RP, Y, receipt(1).hash());

        h.service.handle_statement(a, RP, seconded_m.clone()).unwrap();
        h.service.handle_statement(b, RP, seconded_m.clone()).unwrap();
        h.service.handle_statement(b, RP, valid_m.clone()).unwrap();

        // Stored once, in dependency order.
        assert_eq!(h.service.statements(&RP), vec![seconded_m.clone(), valid_m.clone()]);

        // A relayed the Seconded, so it only needs the Valid.
        assert_eq!(h.network.statements_to(&a), vec![valid_m.clone()]);
        // C knew nothing: Seconded first, then Valid.
        assert_eq!(h.network.statements_to(&c), vec![seconded_m.clone(), valid_m.clone()]);
        assert!(h.network.statements_to(&b).is_empty());

        // Backing saw the candidate once, then the Valid.
        assert_eq!(
            h.backing.calls(),
            vec![
                BackingCall::Candidate(RP, receipt(1)),
                BackingCall::Statement(RP, valid_m),
            ]
        );

        // The duplicate Seconded from B earned nothing.
        assert_eq!(h.reputation.reports_for(&a), vec![BENEFIT_VALID_STATEMENT_FIRST]);
        assert_eq!(h.reputation.reports_for(&b), vec![BENEFIT_VALID_STATEMENT_FIRST]);
    }

    #[test]
    fn test_redelivery_is_idempotent() {
        let h = setup(DistributionConfig::default());
        join(&h, 0xC, vec![RP]);
        let statement = seconded(&RP, X, 1);

        for _ in 0..3 {
            h.service.handle_statement(peer(0xA), RP, statement.clone()).unwrap();
        }

        assert_eq!(h.backing.calls().len(), 1);
        assert_eq!(h.reputation.reports().len(), 1);
        assert_eq!(h.network.statements_to(&peer(0xC)), vec![statement]);
        assert_eq!(
            h.service.inspect_context(&RP, |ctx| ctx
                .knowledge(&peer(0xA))
                .map(|k| k.received_count(&receipt(1).hash()))),
            Some(Some(1))
        );
    }

    #[test]
    fn test_no_statement_sent_twice_to_a_peer() {
        let h = setup(DistributionConfig::default());
        join(&h, 0xC, vec![RP]);
        let candidate = receipt(1).hash();

        h.service.handle_statement(peer(0xA), RP, seconded(&RP, 0, 1)).unwrap();
        h.service.handle_statement(peer(0xA), RP, seconded(&RP, 1, 1)).unwrap();
        h.service.handle_statement(peer(0xB), RP, valid(&RP, 2, candidate)).unwrap();
        h.service.handle_statement(peer(0xB), RP, invalid(&RP, 3, candidate)).unwrap();
        // C re-announces its view; catch-up finds nothing new.
        h.service.handle_neighbor_packet(peer(0xC), NeighborPacket { relay_parents: vec![] });
        h.service.handle_neighbor_packet(peer(0xC), NeighborPacket { relay_parents: vec![RP] });

        let sent = h.network.statements_to(&peer(0xC));
        assert_no_repeats(&sent[..4]);
        assert_eq!(sent.len(), 8, "knowledge is forgotten when RP leaves C's view");
        assert_no_repeats(&sent[4..]);
    }

    #[test]
    fn test_statements_only_go_to_interested_peers() {
        let h = setup(DistributionConfig::default());
        let other: Hash = [0xB2; 32];
        join(&h, 1, vec![RP]);
        join(&h, 2, vec![other]);

        h.service.handle_statement(peer(3), RP, seconded(&RP, X, 1)).unwrap();

        assert_eq!(h.network.statements_to(&peer(1)).len(), 1);
        assert!(h.network.statements_to(&peer(2)).is_empty());
    }

    // =============================================================================
    // SCENARIO 2: EQUIVOCATION
    // =============================================================================

    #[test]
    fn test_three_seconded_from_one_validator() {
        let h = setup(DistributionConfig::default());

        h.service.handle_statement(peer(1), RP, seconded(&RP, X, 1)).unwrap();
        h.service.handle_statement(peer(1), RP, seconded(&RP, X, 2)).unwrap();
        let third = h.service.handle_statement(peer(1), RP, seconded(&RP, X, 3));
        assert!(matches!(
            third,
            Err(DistributionError::EquivocationBoundExceeded { already_reported: false, .. })
        ));

        // Further equivocations from X go unreported.
        let fourth = h.service.handle_statement(peer(2), RP, seconded(&RP, X, 4));
        assert!(matches!(
            fourth,
            Err(DistributionError::EquivocationBoundExceeded { already_reported: true, .. })
        ));

        assert_eq!(
            h.backing.calls(),
            vec![
                BackingCall::Candidate(RP, receipt(1)),
                BackingCall::Candidate(RP, receipt(2)),
            ]
        );
        assert_eq!(h.reputation.count(COST_EQUIVOCATION), 1);
        assert_eq!(h.service.statements(&RP).len(), 2);
    }

    // =============================================================================
    // SCENARIO 3: VIEW TEARDOWN
    // =============================================================================

    #[test]
    fn test_leaving_view_releases_relay_parent() {
        let h = setup(DistributionConfig::default());
        join(&h, 1, vec![RP]);
        h.service.handle_statement(peer(2), RP, seconded(&RP, X, 1)).unwrap();
        assert!(h.service.has_context(&RP));

        h.service.set_own_view(View::new([[0xFF; 32]]));

        assert!(!h.service.has_context(&RP));
        assert!(h.service.statements(&RP).is_empty());
        let reports_before = h.reputation.reports().len();

        let late = h.service.handle_statement(peer(2), RP, valid(&RP, Y, receipt(1).hash()));
        assert!(matches!(late, Err(DistributionError::UnknownRelayParent(_))));
        assert_eq!(h.reputation.reports().len(), reports_before);
        assert!(!h.service.has_context(&RP));
    }

    #[test]
    fn test_rejoining_view_starts_fresh() {
        let h = setup(DistributionConfig::default());
        h.service.handle_statement(peer(1), RP, seconded(&RP, X, 1)).unwrap();
        h.service.set_own_view(View::default());
        h.service.set_own_view(View::new([RP]));

        // The old table is gone, so the candidate is new to backing again.
        h.service.handle_statement(peer(1), RP, seconded(&RP, X, 1)).unwrap();
        assert_eq!(h.backing.calls().len(), 2);
    }

    // =============================================================================
    // SCENARIO 4: DEPENDENCY RACE
    // =============================================================================

    #[test]
    fn test_drop_policy_never_forwards_early_dependent() {
        let h = setup(DistributionConfig::default());
        let early = valid(&RP, Y, receipt(1).hash());

        let result = h.service.handle_statement(peer(1), RP, early.clone());
        assert!(matches!(
            result,
            Err(DistributionError::DependencyNotMet { retained: false, .. })
        ));
        assert!(h.reputation.reports().is_empty());

        h.service.handle_statement(peer(2), RP, seconded(&RP, X, 1)).unwrap();
        assert_eq!(h.backing.calls(), vec![BackingCall::Candidate(RP, receipt(1))]);

        // A different peer relaying the same Valid later is accepted normally.
        h.service.handle_statement(peer(3), RP, early.clone()).unwrap();
        assert_eq!(
            h.backing.calls(),
            vec![
                BackingCall::Candidate(RP, receipt(1)),
                BackingCall::Statement(RP, early),
            ]
        );
    }

    #[test]
    fn test_retain_policy_forwards_after_candidate() {
        let config = DistributionConfig {
            dependency_race_policy: DependencyRacePolicy::Retain,
            ..Default::default()
        };
        let h = setup(config);
        join(&h, 9, vec![RP]);
        let candidate = receipt(1).hash();
        let early_valid = valid(&RP, Y, candidate);
        let early_invalid = invalid(&RP, 2, candidate);

        for statement in [early_valid.clone(), early_invalid.clone()] {
            let result = h.service.handle_statement(peer(1), RP, statement);
            assert!(matches!(
                result,
                Err(DistributionError::DependencyNotMet { retained: true, .. })
            ));
        }
        assert!(h.backing.calls().is_empty());
        assert!(h.network.statements_to(&peer(9)).is_empty());

        let seconded_m = seconded(&RP, X, 1);
        h.service.handle_statement(peer(2), RP, seconded_m.clone()).unwrap();

        assert_eq!(
            h.backing.calls(),
            vec![
                BackingCall::Candidate(RP, receipt(1)),
                BackingCall::Statement(RP, early_valid.clone()),
                BackingCall::Statement(RP, early_invalid.clone()),
            ]
        );
        assert_eq!(
            h.network.statements_to(&peer(9)),
            vec![seconded_m, early_valid, early_invalid]
        );
    }

    // =============================================================================
    // SCENARIO 5: CATCH-UP
    // =============================================================================

    #[test]
    fn test_late_peer_catches_up_in_dependency_order() {
        let h = setup(DistributionConfig::default());
        let first = seconded(&RP, X, 1);
        let second = seconded(&RP, Y, 2);
        let valid_first = valid(&RP, 2, receipt(1).hash());

        h.service.handle_statement(peer(1), RP, first.clone()).unwrap();
        h.service.handle_statement(peer(1), RP, second.clone()).unwrap();
        h.service.handle_statement(peer(1), RP, valid_first.clone()).unwrap();

        join(&h, 0xC, vec![RP]);

        assert_eq!(
            h.network.statements_to(&peer(0xC)),
            vec![first, valid_first, second]
        );
    }

    #[test]
    fn test_stopped_relay_parent_sends_nothing() {
        let h = setup(DistributionConfig::default());
        h.service.handle_statement(peer(1), RP, seconded(&RP, X, 1)).unwrap();
        h.service.stop_work(RP);
        join(&h, 0xC, vec![RP]);

        assert!(h.network.statements_to(&peer(0xC)).is_empty());
        let result = h.service.handle_statement(peer(1), RP, seconded(&RP, Y, 2));
        assert!(matches!(result, Err(DistributionError::Stopped)));
    }
}
