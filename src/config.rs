//! # Config loader
//!
//! Decodes a JSON document into the initial [`MachineState`]: a map of
//! named [`DataStore`]s (§4.G) and the ordered list of `keys` the stage
//! loop reads every cycle.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::ast::{DataStore, IntExp, Location, MachineState};
use crate::error::{Result, TcamError};
use crate::expr::parse_locexp;

/// Parse a config document into the initial machine state.
pub fn parse_config(value: &Value) -> Result<MachineState> {
    let obj = value
        .as_object()
        .ok_or_else(|| TcamError::parse("the configuration document must be a json object"))?;

    let stores = parse_data_stores(obj)?;
    let keys = parse_keys(obj)?;

    debug!(stores = stores.len(), keys = keys.len(), "parsed config document");
    Ok(MachineState::new(stores, keys))
}

fn parse_data_stores(obj: &serde_json::Map<String, Value>) -> Result<HashMap<String, DataStore>> {
    let entries = obj
        .get("data stores")
        .ok_or_else(|| TcamError::parse("no 'data stores' field in configuration file"))?
        .as_array()
        .ok_or_else(|| TcamError::parse("'data stores' field should be a list"))?;

    let mut stores = HashMap::new();
    for entry in entries {
        let (name, store) = parse_data_store(entry)?;
        stores.insert(name, store);
    }
    Ok(stores)
}

fn parse_data_store(value: &Value) -> Result<(String, DataStore)> {
    let obj = value
        .as_object()
        .ok_or_else(|| TcamError::parse("each entry in 'data stores' should be a json object"))?;
    let prefix = "error parsing data store: ";

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| TcamError::parse(format!("{}expected a string 'name' field", prefix)))?
        .to_string();
    let width = obj
        .get("width")
        .and_then(Value::as_u64)
        .filter(|w| *w > 0)
        .ok_or_else(|| TcamError::parse(format!("{}expected a positive integer 'width' field", prefix)))?;
    let read = obj
        .get("read")
        .and_then(Value::as_bool)
        .ok_or_else(|| TcamError::parse(format!("{}expected a bool 'read' field", prefix)))?;
    let write = obj
        .get("write")
        .and_then(Value::as_bool)
        .ok_or_else(|| TcamError::parse(format!("{}expected a bool 'write' field", prefix)))?;
    let persistent = obj
        .get("persistent")
        .and_then(Value::as_bool)
        .ok_or_else(|| TcamError::parse(format!("{}expected a bool 'persistent' field", prefix)))?;
    let masked_writes = obj
        .get("masked-writes")
        .and_then(Value::as_bool)
        .ok_or_else(|| TcamError::parse(format!("{}expected a bool 'masked-writes' field", prefix)))?;

    let store = DataStore::new_zeroed(width as usize, read, write, persistent, masked_writes);
    Ok((name, store))
}

fn parse_keys(obj: &serde_json::Map<String, Value>) -> Result<Vec<Location>> {
    let entries = obj
        .get("keys")
        .ok_or_else(|| TcamError::parse("no 'keys' field in configuration file"))?
        .as_array()
        .ok_or_else(|| TcamError::parse("'keys' field should be a list"))?;
    if entries.is_empty() {
        return Err(TcamError::parse("'keys' field should be nonempty"));
    }
    entries.iter().map(parse_key).collect()
}

fn parse_key(value: &Value) -> Result<Location> {
    let key = value
        .as_str()
        .ok_or_else(|| TcamError::parse("each entry in 'keys' should be a string"))?;
    let prefix = format!("failure while parsing key '{}': ", key);

    let locexp = parse_locexp(key).map_err(|e| TcamError::parse(format!("{}{}", prefix, e)))?;

    let start = match locexp.start.as_ref() {
        IntExp::Const(n) => n.value,
        _ => {
            return Err(TcamError::parse(format!(
                "{}each key should start at a simple integer index",
                prefix
            )))
        }
    };
    let end = match locexp.end.as_ref() {
        IntExp::Const(n) => n.value,
        _ => {
            return Err(TcamError::parse(format!(
                "{}each key should end at a simple integer index",
                prefix
            )))
        }
    };

    Location::new(locexp.name, start as u64, end as u64)
        .map_err(|e| TcamError::parse(format!("{}{}", prefix, e)))
}
