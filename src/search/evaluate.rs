//! Per-ticket evaluation of search terms.

use crate::cancel::CancellationToken;
use crate::query::SearchTerm;
use crate::types::Ticket;

use super::mask::InclusionMask;

/// Decides whether `ticket` satisfies every term.
///
/// An include term needs its pattern somewhere in the candidate fields (or the
/// identifier); an exclude term rejects the ticket when its pattern is found
/// there. Evaluation stops at the first failing term. No terms include
/// everything.
pub fn ticket_matches(ticket: &Ticket, terms: &[SearchTerm]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let id_text = ticket.id.to_string();
    terms
        .iter()
        .all(|term| term.found_in(ticket, &id_text) != term.is_exclude())
}

/// Evaluates one batch into a mask over batch-local indices.
///
/// Returns `None` as soon as the token reports cancellation; the token is
/// checked before every ticket.
pub(crate) fn evaluate_batch(
    tickets: &[Ticket],
    terms: &[SearchTerm],
    cancel_token: &CancellationToken,
) -> Option<InclusionMask> {
    let mut mask = InclusionMask::new(tickets.len());
    for (index, ticket) in tickets.iter().enumerate() {
        cancel_token.is_cancelled()?;
        if ticket_matches(ticket, terms) {
            mask.insert(index);
        }
    }
    Some(mask)
}
