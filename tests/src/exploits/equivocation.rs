//! # Exploit: Seconded Equivocation
//!
//! A malicious validator seconds many candidates under one relay-parent and
//! has colluding peers relay all of them.
//!
//! ## Defense
//!
//! - The table keeps at most two `Seconded` per validator; the rest are
//!   dropped and the first excess is reported once.
//! - Each peer may tell us about at most four candidates per validator;
//!   beyond that every new one costs reputation.
//! - Honest peers only ever hear about the two accepted candidates.

#[cfg(test)]
mod tests {
    use qc_05_statement_distribution::domain::reputation::{
        COST_EQUIVOCATION, COST_KNOWLEDGE_BOUND,
    };
    use qc_05_statement_distribution::events::NeighborPacket;
    use qc_05_statement_distribution::test_utils::*;
    use qc_05_statement_distribution::{
        DistributionConfig, DistributionError, StatementDistributionApi, View,
    };
    use shared_types::{Hash, ValidatorIndex};

    const RP: Hash = [0xE0; 32];
    const EQUIVOCATOR: u32 = 0;

    fn setup() -> TestHarness {
        init_tracing();
        let h = TestHarness::new(DistributionConfig::default(), 4);
        h.service.set_own_view(View::new([RP]));
        h
    }

    #[test]
    fn test_single_relay_bounded_by_knowledge_and_table() {
        let h = setup();
        let relay = peer(0x66);

        let results: Vec<_> = (1..=10)
            .map(|para_id| {
                h.service
                    .handle_statement(relay, RP, seconded(&RP, EQUIVOCATOR, para_id))
            })
            .collect();

        assert!(results[0].is_ok() && results[1].is_ok());
        assert!(matches!(
            results[2],
            Err(DistributionError::EquivocationBoundExceeded { already_reported: false, .. })
        ));
        assert!(matches!(
            results[3],
            Err(DistributionError::EquivocationBoundExceeded { already_reported: true, .. })
        ));
        for result in &results[4..] {
            assert!(matches!(
                result,
                Err(DistributionError::KnowledgeBoundExceeded { .. })
            ));
        }

        assert_eq!(h.reputation.count(COST_EQUIVOCATION), 1);
        assert_eq!(h.reputation.count(COST_KNOWLEDGE_BOUND), 6);

        let (known, seconded_count) = h
            .service
            .inspect_context(&RP, |ctx| {
                (
                    ctx.knowledge(&relay)
                        .map(|k| k.known_candidates_for(&ValidatorIndex(EQUIVOCATOR)).len()),
                    ctx.table.seconded_count(&ValidatorIndex(EQUIVOCATOR)),
                )
            })
            .unwrap();
        assert_eq!(known, Some(4));
        assert_eq!(seconded_count, 2);
    }

    #[test]
    fn test_colluding_relays_cannot_grow_table() {
        let h = setup();
        let honest = peer(0x01);
        h.service.peer_connected(honest);
        h.service.handle_neighbor_packet(
            honest,
            NeighborPacket {
                relay_parents: vec![RP],
            },
        );

        for relay in 0x10..0x20u8 {
            for para_id in 1..=4 {
                let _ = h.service.handle_statement(
                    peer(relay),
                    RP,
                    seconded(&RP, EQUIVOCATOR, para_id + relay as u32),
                );
            }
        }

        assert_eq!(h.service.statements(&RP).len(), 2);
        assert_eq!(h.network.statements_to(&honest).len(), 2);
        assert_eq!(h.backing.calls().len(), 2);
        assert_eq!(h.reputation.count(COST_EQUIVOCATION), 1);
    }

    #[test]
    fn test_honest_validators_unaffected() {
        let h = setup();
        for para_id in 1..=5 {
            let _ = h
                .service
                .handle_statement(peer(0x66), RP, seconded(&RP, EQUIVOCATOR, para_id));
        }

        // Same peer, other validators: their own budgets are untouched.
        for validator in 1..4 {
            h.service
                .handle_statement(peer(0x66), RP, seconded(&RP, validator, 100 + validator))
                .unwrap();
        }
        assert_eq!(h.service.statements(&RP).len(), 5);
    }
}
