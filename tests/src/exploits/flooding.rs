//! # Exploit: Statement Flooding
//!
//! A peer pushes more statements about one candidate than there are
//! legitimate ones (`2 × validators`).
//!
//! ## Defense
//!
//! Each (peer, candidate) pair has a counter of statements received. Once it
//! reaches the bound, further new statements are dropped unprocessed and
//! every violation costs the peer reputation.
//!
//! Dependents for candidates we hold no `Seconded` for are not tracked one
//! by one: they draw on a single per-peer budget of the same size, so a
//! signer inventing candidate hashes cannot grow our memory.

#[cfg(test)]
mod tests {
    use qc_05_statement_distribution::domain::reputation::COST_APPARENT_FLOOD;
    use qc_05_statement_distribution::test_utils::*;
    use qc_05_statement_distribution::{
        check_context_invariants, DependencyRacePolicy, DistributionConfig, DistributionError,
        StatementDistributionApi, View,
    };
    use shared_types::{CandidateHash, Hash, SignedStatement};

    const RP: Hash = [0xF1; 32];
    const VALIDATORS: u32 = 3;

    /// Every distinct statement three validators can make about candidate 1.
    fn all_statements() -> Vec<SignedStatement> {
        let candidate = receipt(1).hash();
        let mut statements: Vec<SignedStatement> =
            (0..VALIDATORS).map(|v| seconded(&RP, v, 1)).collect();
        statements.extend((0..VALIDATORS).map(|v| valid(&RP, v, candidate)));
        statements.extend((0..VALIDATORS).map(|v| invalid(&RP, v, candidate)));
        statements
    }

    fn setup() -> TestHarness {
        init_tracing();
        let h = TestHarness::new(DistributionConfig::default(), VALIDATORS);
        h.service.set_own_view(View::new([RP]));
        h
    }

    #[test]
    fn test_flood_bound_caps_statements_per_candidate() {
        let h = setup();
        let attacker = peer(0x66);
        let candidate = receipt(1).hash();

        let results: Vec<_> = all_statements()
            .into_iter()
            .map(|s| h.service.handle_statement(attacker, RP, s))
            .collect();

        assert!(results[..6].iter().all(Result::is_ok));
        for result in &results[6..] {
            assert!(matches!(
                result,
                Err(DistributionError::FloodBoundExceeded { limit: 6, count: 7, .. })
            ));
        }

        assert_eq!(h.reputation.count(COST_APPARENT_FLOOD), 3);
        assert_eq!(h.service.statements(&RP).len(), 6);
        let (count, invariants) = h
            .service
            .inspect_context(&RP, |ctx| {
                (
                    ctx.knowledge(&attacker).map(|k| k.received_count(&candidate)),
                    check_context_invariants(ctx),
                )
            })
            .unwrap();
        assert_eq!(count, Some(6));
        assert_eq!(invariants, Ok(()));
    }

    #[test]
    fn test_flood_bound_is_per_peer() {
        let h = setup();
        for s in all_statements().into_iter().take(6) {
            h.service.handle_statement(peer(0x66), RP, s).unwrap();
        }

        // An honest peer still gets its statements through.
        let late = all_statements().pop().unwrap();
        h.service.handle_statement(peer(0x01), RP, late.clone()).unwrap();
        assert!(h.service.statements(&RP).contains(&late));
        assert!(h.reputation.reports_for(&peer(0x01)).iter().all(|c| c.value > 0));
    }

    #[test]
    fn test_repeats_do_not_advance_counter() {
        let h = setup();
        let attacker = peer(0x66);
        let statement = seconded(&RP, 0, 1);

        for _ in 0..50 {
            h.service.handle_statement(attacker, RP, statement.clone()).unwrap();
        }

        assert_eq!(h.reputation.count(COST_APPARENT_FLOOD), 0);
        assert_eq!(
            h.service.inspect_context(&RP, |ctx| ctx
                .knowledge(&attacker)
                .map(|k| k.received_count(&receipt(1).hash()))),
            Some(Some(1))
        );
    }

    fn invented_candidate(n: u32) -> CandidateHash {
        let mut hash = [0xCC; 32];
        hash[..4].copy_from_slice(&n.to_le_bytes());
        CandidateHash(hash)
    }

    #[test]
    fn test_dependents_for_invented_candidates_stay_bounded() {
        let h = setup();
        let attacker = peer(0x66);
        let flood_limit = 2 * VALIDATORS as usize;

        for n in 0..5_000 {
            let _ = h
                .service
                .handle_statement(attacker, RP, valid(&RP, 1, invented_candidate(n)));
        }

        let (known, counters, unanchored, invariants) = h
            .service
            .inspect_context(&RP, |ctx| {
                let knowledge = ctx.knowledge(&attacker).unwrap();
                (
                    knowledge.known_statement_count(),
                    knowledge.received_counts().count(),
                    knowledge.unanchored_received(),
                    check_context_invariants(ctx),
                )
            })
            .unwrap();
        assert_eq!(known, 0);
        assert_eq!(counters, 0);
        assert_eq!(unanchored, flood_limit);
        assert_eq!(invariants, Ok(()));
        assert_eq!(
            h.reputation.count(COST_APPARENT_FLOOD),
            5_000 - flood_limit
        );

        // Real candidates from the same peer are still tracked normally.
        let statement = seconded(&RP, 0, 1);
        h.service.handle_statement(attacker, RP, statement.clone()).unwrap();
        assert_eq!(h.service.statements(&RP), vec![statement]);
    }

    #[test]
    fn test_retain_buffer_bounded_per_peer() {
        init_tracing();
        let config = DistributionConfig {
            dependency_race_policy: DependencyRacePolicy::Retain,
            ..Default::default()
        };
        let h = TestHarness::new(config, VALIDATORS);
        h.service.set_own_view(View::new([RP]));

        for n in 0..500 {
            let _ = h
                .service
                .handle_statement(peer(0x66), RP, valid(&RP, 2, invented_candidate(n)));
        }

        assert_eq!(
            h.service.inspect_context(&RP, |ctx| ctx.retained_len()),
            Some(2 * VALIDATORS as usize)
        );
    }

    #[test]
    fn test_undecodable_garbage_costs_each_time() {
        let h = setup();
        for junk in [vec![], vec![0xFF], vec![1, 2, 3, 4]] {
            let result = h.service.handle_peer_message(peer(0x66), &junk);
            assert!(matches!(result, Err(DistributionError::MessageNotDecodable(_))));
        }
        assert_eq!(h.reputation.reports_for(&peer(0x66)).len(), 3);
        assert!(!h.service.has_context(&RP));
    }
}
