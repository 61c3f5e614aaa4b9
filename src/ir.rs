//! # IR loader
//!
//! Decodes a JSON document into a [`Tcam`]: an ordered list of tables of
//! rules (§4.F). Structural validation — table/rule index annotations,
//! field presence and type, action dispatch, the pattern-shape invariant —
//! all happens here, eagerly, before a single stage is ever run.

use serde_json::Value;
use tracing::debug;

use crate::ast::{Action, Rule, Table, Tcam};
use crate::error::{Result, TcamError};
use crate::expr::{parse_intexp, parse_locexp};
use crate::pattern::parse_pattern;

/// Parse a full IR document (the top-level JSON array of tables) and
/// validate the pattern-shape invariant across it.
pub fn parse_ir(value: &Value) -> Result<Tcam> {
    let tcam = parse_tcam(value)?;
    validate_tcam(&tcam)?;
    debug!(tables = tcam.len(), "parsed IR document");
    Ok(tcam)
}

fn parse_tcam(value: &Value) -> Result<Tcam> {
    let tables = value
        .as_array()
        .ok_or_else(|| TcamError::parse("the TCAM document must be a list of tables"))?;
    tables
        .iter()
        .enumerate()
        .map(|(i, table)| parse_table(i, table))
        .collect()
}

fn parse_table(table_idx: usize, value: &Value) -> Result<Table> {
    let rules = value.as_array().ok_or_else(|| {
        TcamError::parse(format!(
            "table {} is expected to be a list of rules",
            table_idx
        ))
    })?;
    rules
        .iter()
        .enumerate()
        .map(|(rule_idx, rule)| parse_rule(table_idx, rule_idx, rule))
        .collect()
}

fn parse_rule(table_idx: usize, rule_idx: usize, value: &Value) -> Result<Rule> {
    let prefix = format!("rule {} in table {}: ", rule_idx, table_idx);
    let obj = value
        .as_object()
        .ok_or_else(|| TcamError::parse(format!("{}expected a json object", prefix)))?;

    let table_annot = obj
        .get("table")
        .and_then(Value::as_i64)
        .ok_or_else(|| TcamError::parse(format!("{}missing or non-integer 'table' field", prefix)))?;
    let rule_annot = obj
        .get("rule")
        .and_then(Value::as_i64)
        .ok_or_else(|| TcamError::parse(format!("{}missing or non-integer 'rule' field", prefix)))?;
    if table_annot != table_idx as i64 || rule_annot != rule_idx as i64 {
        return Err(TcamError::parse(format!(
            "{}annotation is for rule {} in table {}",
            prefix, rule_annot, table_annot
        )));
    }

    let patterns_json = obj
        .get("patterns")
        .and_then(Value::as_array)
        .ok_or_else(|| TcamError::parse(format!("{}missing or non-list 'patterns' field", prefix)))?;
    let patterns = patterns_json
        .iter()
        .map(|p| {
            let s = p
                .as_str()
                .ok_or_else(|| TcamError::parse(format!("{}pattern entries must be strings", prefix)))?;
            parse_pattern(s)
        })
        .collect::<Result<Vec<_>>>()?;

    let actions_json = obj
        .get("actions")
        .and_then(Value::as_array)
        .ok_or_else(|| TcamError::parse(format!("{}missing or non-list 'actions' field", prefix)))?;
    let mut actions: Vec<Action> = Vec::new();
    for action_json in actions_json {
        let action = parse_action(&prefix, action_json)?;
        if !actions.contains(&action) {
            actions.push(action);
        }
    }

    Ok(Rule { patterns, actions })
}

fn parse_action(prefix: &str, value: &Value) -> Result<Action> {
    let obj = value
        .as_object()
        .ok_or_else(|| TcamError::parse(format!("{}each action must be a json object", prefix)))?;
    let field = |name: &str| -> Result<&str> {
        obj.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| TcamError::parse(format!("{}action missing '{}' field", prefix, name)))
    };

    match field("type")? {
        "MoveCursor" => {
            let numbits = parse_intexp(field("numbits")?)?;
            Ok(Action::MoveCursor(numbits))
        }
        "CopyData" => {
            let src = parse_intexp(field("src")?)?;
            let dst = parse_locexp(field("dst")?)?;
            Ok(Action::CopyData { src, dst })
        }
        "ExtractHeader" => {
            let id = field("id")?.to_string();
            let loc = parse_locexp(field("loc")?)?;
            Ok(Action::ExtractHeader { id, loc })
        }
        other => Err(TcamError::parse(format!(
            "{}invalid action type '{}', expected 'MoveCursor', 'CopyData', or 'ExtractHeader'",
            prefix, other
        ))),
    }
}

/// Validate the shape invariant (§3): every rule's pattern list has the
/// same length and pairwise pattern widths as the first rule of the first
/// table.
fn validate_tcam(tcam: &Tcam) -> Result<()> {
    let first_rule = tcam
        .first()
        .and_then(|table| table.first())
        .ok_or_else(|| TcamError::parse("the TCAM must contain at least one rule"))?;
    let expected_shape: Vec<usize> = first_rule.patterns.iter().map(|p| p.value.length()).collect();

    for table in tcam {
        for rule in table {
            let shape: Vec<usize> = rule.patterns.iter().map(|p| p.value.length()).collect();
            if shape != expected_shape {
                return Err(TcamError::parse(format!(
                    "rule pattern shape {:?} does not match the TCAM's shape {:?}",
                    shape, expected_shape
                )));
            }
        }
    }
    Ok(())
}
