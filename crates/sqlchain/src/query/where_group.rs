//! WHERE rendering with AND-over-OR grouping.
//!
//! Conditions are split into OR-separated terms; consecutive AND conditions form one
//! term. When there is more than one term, each multi-condition term is
//! parenthesized:
//!
//! - `a AND b OR c` -> `(a AND b) OR c`
//! - `a OR b AND c OR d` -> `a OR (b AND c) OR d`
//! - `a AND b` -> `a AND b`

use crate::clause::{Connector, WhereClause};
use crate::ident::RenderContext;

/// Render `WHERE ...`, or an empty string if there are no conditions.
///
/// `required` conditions are ANDed with the grouped expression as a whole; a
/// multi-term expression is parenthesized first: `(a OR b) AND id = :id_1`.
pub(crate) fn render_where(
    clauses: &[WhereClause],
    required: &[WhereClause],
    ctx: &RenderContext<'_>,
) -> String {
    let mut terms: Vec<Vec<String>> = Vec::new();
    for clause in clauses {
        let fragment = clause.render(ctx);
        match (clause.connector(), terms.last_mut()) {
            (Connector::Or, Some(_)) | (_, None) => terms.push(vec![fragment]),
            (Connector::Plain | Connector::And, Some(term)) => term.push(fragment),
        }
    }

    let grouped = terms.len() > 1;
    let mut conjuncts = Vec::with_capacity(required.len() + 1);
    if !terms.is_empty() {
        let expression = terms
            .into_iter()
            .map(|term| {
                let joined = term.join(" AND ");
                if grouped && term.len() > 1 {
                    format!("({joined})")
                } else {
                    joined
                }
            })
            .collect::<Vec<_>>()
            .join(" OR ");
        conjuncts.push(if grouped && !required.is_empty() {
            format!("({expression})")
        } else {
            expression
        });
    }
    conjuncts.extend(required.iter().map(|clause| clause.render(ctx)));

    if conjuncts.is_empty() {
        return String::new();
    }
    format!("WHERE {}", conjuncts.join(" AND "))
}
