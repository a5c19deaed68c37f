//! # Dissemination
//!
//! Computes what each interested peer is missing and marks it as known.
//!
//! Sends are planned in dependency order: a peer never gets a `Valid` or
//! `Invalid` for a candidate before some `Seconded` for it. Nothing is
//! awaited between sends, so a peer that learned a statement elsewhere may
//! still receive it from us.

use shared_types::{SignedStatement, StatementFingerprint, StatementKind};

use super::{PeerId, PeerKnowledge, RelayParentContext, StatementTable};

/// Statements to send to one peer, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub peer: PeerId,
    pub statements: Vec<SignedStatement>,
}

fn offer(knowledge: &mut PeerKnowledge, statement: &SignedStatement, out: &mut Vec<SignedStatement>) {
    let fingerprint = statement.fingerprint();
    if knowledge.can_send(&fingerprint) {
        knowledge.note_sent(fingerprint);
        out.push(statement.clone());
    }
}

/// Delta for one peer after `fingerprint` was accepted.
fn statement_delta(
    table: &StatementTable,
    knowledge: &mut PeerKnowledge,
    fingerprint: &StatementFingerprint,
) -> Vec<SignedStatement> {
    let mut out = Vec::new();
    let (Some(statement), Some(entry)) = (
        table.get(fingerprint),
        table.candidate(&fingerprint.candidate_hash),
    ) else {
        return out;
    };

    match fingerprint.kind {
        StatementKind::Seconded => {
            offer(knowledge, statement, &mut out);
            for dependent in entry
                .statements()
                .iter()
                .filter(|s| s.kind() != StatementKind::Seconded)
            {
                offer(knowledge, dependent, &mut out);
            }
        }
        StatementKind::Valid | StatementKind::Invalid => {
            if !knowledge.knows_candidate(&fingerprint.candidate_hash) {
                for seconded in entry
                    .statements()
                    .iter()
                    .filter(|s| s.kind() == StatementKind::Seconded)
                {
                    offer(knowledge, seconded, &mut out);
                    if knowledge.knows_candidate(&fingerprint.candidate_hash) {
                        break;
                    }
                }
            }
            offer(knowledge, statement, &mut out);
        }
    }
    out
}

/// Everything held in `table` that the peer does not know, grouped per
/// candidate in acceptance order.
fn catch_up_delta(table: &StatementTable, knowledge: &mut PeerKnowledge) -> Vec<SignedStatement> {
    let mut out = Vec::new();
    for (_, entry) in table.candidates() {
        for statement in entry.statements() {
            offer(knowledge, statement, &mut out);
        }
    }
    out
}

/// Plan sends of a newly accepted statement to every peer in `interested`.
pub fn disseminate(
    ctx: &mut RelayParentContext,
    interested: &[PeerId],
    fingerprint: &StatementFingerprint,
) -> Vec<Delivery> {
    interested
        .iter()
        .filter_map(|peer| {
            let (table, knowledge) = ctx.table_and_knowledge(*peer);
            let statements = statement_delta(table, knowledge, fingerprint);
            (!statements.is_empty()).then_some(Delivery {
                peer: *peer,
                statements,
            })
        })
        .collect()
}

/// Plan the sends that bring a peer up to date after it added this
/// relay-parent to its view.
pub fn catch_up(ctx: &mut RelayParentContext, peer: PeerId) -> Option<Delivery> {
    let (table, knowledge) = ctx.table_and_knowledge(peer);
    let statements = catch_up_delta(table, knowledge);
    (!statements.is_empty()).then_some(Delivery { peer, statements })
}
