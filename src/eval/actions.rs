//! # Action application
//!
//! Implements the three generic TCAM actions (§4.H): moving the cursor,
//! extracting a packet header, and copying a value into a data store.

use crate::ast::{IntExp, LocationExp, MachineState, PACKET};
use crate::bitvector::BitVector;
use crate::error::{Result, TcamError};
use crate::eval::expr_eval::{evaluate_intexp, evaluate_locexp, read_location};

/// `MoveCursor n`: advance the cursor by `n` bits, failing if that would
/// move it past the end of the packet.
pub fn apply_move(num_bits: &IntExp, state: &mut MachineState, packet: &BitVector) -> Result<()> {
    let n = evaluate_intexp(num_bits, state, packet)?;
    if state.cursor + n.value as u64 > packet.length() as u64 {
        return Err(TcamError::runtime(format!(
            "attempt to move cursor {} bits in stage {} goes beyond end of packet: cursor is {}, packet length is {}",
            n.value, state.stage, state.cursor, packet.length()
        )));
    }
    state.cursor += n.value as u64;
    Ok(())
}

/// `ExtractHeader name loc`: read `loc` from the packet and record it under
/// `name`, failing if `loc` does not name the packet or `name` was already
/// extracted.
pub fn apply_extract(name: &str, loc: &LocationExp, state: &mut MachineState, packet: &BitVector) -> Result<()> {
    if loc.name != PACKET {
        return Err(TcamError::runtime(format!(
            "error extracting header '{}': extraction must always come from the packet",
            name
        )));
    }
    if state.has_header(name) {
        return Err(TcamError::runtime(format!(
            "error extracting header '{}': a header with this name was already extracted",
            name
        )));
    }
    let resolved = evaluate_locexp(loc, state, packet)?;
    let bits = read_location(&resolved, state, packet)?;
    state.insert_header(name.to_string(), bits)
}

/// `CopyData src dst`: evaluate `src`, then write its bits into `dst`,
/// obeying the destination store's writability, width, and masked-write
/// policy.
pub fn apply_copy(src: &IntExp, dst: &LocationExp, state: &mut MachineState, packet: &BitVector) -> Result<()> {
    let value = evaluate_intexp(src, state, packet)?;
    let value_bits = BitVector::from_uint(value.value, value.width as usize);
    let dst_loc = evaluate_locexp(dst, state, packet)?;

    if dst_loc.name == PACKET {
        return Err(TcamError::runtime("cannot write to packet: it is immutable".to_string()));
    }
    if value_bits.length() as u64 != dst_loc.length() {
        return Err(TcamError::runtime(format!(
            "error copying to {}: value has length {}, destination has length {}",
            dst_loc.name,
            value_bits.length(),
            dst_loc.length()
        )));
    }

    let store = state.stores.get_mut(&dst_loc.name).ok_or_else(|| {
        TcamError::runtime(format!("error copying to {}: no such destination store", dst_loc.name))
    })?;
    if !store.write {
        return Err(TcamError::runtime(format!(
            "error copying to {}: destination is not writable",
            dst_loc.name
        )));
    }
    if dst_loc.end as usize >= store.value.length() {
        return Err(TcamError::runtime(format!(
            "error copying to {}: write ends at bit {}, but the store only has {} bits",
            dst_loc.name,
            dst_loc.end,
            store.value.length()
        )));
    }

    if !store.masked_writes {
        store.value.zero_all();
    }
    store.value.write_slice(dst_loc.start as usize, dst_loc.end as usize, &value_bits)
}
