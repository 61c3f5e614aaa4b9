//! # Evaluator
//!
//! The stage-indexed TCAM match loop (§4.H): for each stage, build the
//! current key values, find the first matching rule, apply its action set
//! ("others" before any `MoveCursor`), and advance.

pub mod actions;
pub mod expr_eval;

use tracing::trace;

use crate::ast::{Action, MachineState, Rule, Table, Tcam};
use crate::bitvector::BitVector;
use crate::error::{Result, TcamError};

/// Validate that the configured keys agree in count and width with the
/// first rule's patterns, before any stage runs.
pub fn validate_keys_patterns(tcam: &Tcam, state: &MachineState) -> Result<()> {
    let first_patterns = &tcam
        .first()
        .and_then(|table| table.first())
        .ok_or_else(|| TcamError::parse("the TCAM must contain at least one rule"))?
        .patterns;

    if first_patterns.len() != state.keys.len() {
        return Err(TcamError::parse(format!(
            "key-pattern mismatch: the config defines {} keys, but the TCAM rules have {} patterns",
            state.keys.len(),
            first_patterns.len()
        )));
    }
    for (key, pattern) in state.keys.iter().zip(first_patterns.iter()) {
        if key.length() as usize != pattern.value.length() {
            return Err(TcamError::parse(format!(
                "key-pattern mismatch: key {}[{}:{}] has length {}, but the corresponding pattern has length {}",
                key.name,
                key.start,
                key.end,
                key.length(),
                pattern.value.length()
            )));
        }
    }
    Ok(())
}

/// Build the key values for the current stage and return the first
/// matching rule's action set, or an empty set if no rule matches.
fn table_match(table: &Table, state: &MachineState) -> Result<Vec<Action>> {
    let keys: Vec<BitVector> = state
        .keys
        .iter()
        .map(|loc| {
            let store = state.stores.get(&loc.name).ok_or_else(|| {
                TcamError::runtime(format!("key names unknown store '{}'", loc.name))
            })?;
            store.value.slice(loc.start as usize, loc.end as usize)
        })
        .collect::<Result<Vec<_>>>()?;

    for rule in table {
        let all_match = rule
            .patterns
            .iter()
            .zip(keys.iter())
            .map(|(pattern, key)| pattern.matches(key))
            .collect::<Result<Vec<bool>>>()?
            .into_iter()
            .all(|m| m);
        if all_match {
            return Ok(rule.actions.clone());
        }
    }
    Ok(Vec::new())
}

fn apply_action(action: &Action, state: &mut MachineState, packet: &BitVector) -> Result<()> {
    match action {
        Action::MoveCursor(numbits) => actions::apply_move(numbits, state, packet),
        Action::ExtractHeader { id, loc } => actions::apply_extract(id, loc, state, packet),
        Action::CopyData { src, dst } => actions::apply_copy(src, dst, state, packet),
    }
}

/// Run exactly one stage: match, then apply every non-move action before
/// any move action, then advance `state.stage`. A no-op once
/// `state.stage >= tcam.len()`.
pub fn interp_step(tcam: &Tcam, state: &mut MachineState, packet: &BitVector) -> Result<()> {
    if state.stage >= tcam.len() {
        return Ok(());
    }
    let table = &tcam[state.stage];
    let matched = table_match(table, state)?;

    let (moves, others): (Vec<Action>, Vec<Action>) =
        matched.into_iter().partition(|a| matches!(a, Action::MoveCursor(_)));

    trace!(stage = state.stage, actions = others.len() + moves.len(), "applying stage actions");

    for action in &others {
        apply_action(action, state, packet)?;
    }
    for action in &moves {
        apply_action(action, state, packet)?;
    }

    state.stage += 1;
    Ok(())
}

/// Run `interp_step` until every stage has executed.
pub fn interp_tcam(tcam: &Tcam, state: &mut MachineState, packet: &BitVector) -> Result<()> {
    while state.stage < tcam.len() {
        interp_step(tcam, state, packet)?;
    }
    Ok(())
}
