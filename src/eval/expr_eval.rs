//! # Expression evaluation
//!
//! Walks an [`IntExp`]/[`LocationExp`] against the current [`MachineState`]
//! and packet, producing [`SizedInt`]s and [`Location`]s (§4.H).

use crate::ast::{ArithOp, IntExp, Location, LocationExp, MachineState, PACKET};
use crate::bitvector::BitVector;
use crate::error::{Result, TcamError};
use crate::sizedint::SizedInt;

/// Read the bits named by a resolved [`Location`], honoring the reserved
/// `packet` region (relative to `state.cursor`) or a named, readable store.
pub fn read_location(loc: &Location, state: &MachineState, packet: &BitVector) -> Result<BitVector> {
    let source = if loc.name == PACKET {
        if state.cursor + loc.end + 1 > packet.length() as u64 {
            return Err(TcamError::runtime(format!(
                "attempt to read {}[{}:{}] in stage {} goes beyond end of packet: cursor is {}, packet length is {}",
                loc.name, loc.start, loc.end, state.stage, state.cursor, packet.length()
            )));
        }
        packet.slice(state.cursor as usize, packet.length() - 1)?
    } else {
        let store = state.stores.get(&loc.name).ok_or_else(|| {
            TcamError::runtime(format!("attempt to read unknown store '{}'", loc.name))
        })?;
        if !store.read {
            return Err(TcamError::runtime(format!(
                "attempt to read {} failed: '{}' is not readable",
                loc.name, loc.name
            )));
        }
        store.value.clone()
    };

    if loc.length() as usize > source.length() {
        return Err(TcamError::runtime(format!(
            "attempt to read {}[{}:{}] failed: '{}' only has {} bits",
            loc.name,
            loc.start,
            loc.end,
            loc.name,
            source.length()
        )));
    }

    source.slice(loc.start as usize, loc.end as usize)
}

/// Evaluate a location expression's bounds, producing a concrete
/// [`Location`]. Fails if the resolved start position is later than the end.
pub fn evaluate_locexp(locexp: &LocationExp, state: &MachineState, packet: &BitVector) -> Result<Location> {
    let start = evaluate_intexp(&locexp.start, state, packet)?.value;
    let end = evaluate_intexp(&locexp.end, state, packet)?.value;
    Location::new(locexp.name.clone(), start as u64, end as u64)
}

/// Evaluate an arithmetic expression, including the CAST pseudo-operator
/// whose left operand supplies a target width rather than a value.
pub fn evaluate_op(op: ArithOp, left: &IntExp, right: &IntExp, state: &MachineState, packet: &BitVector) -> Result<SizedInt> {
    let left_val = evaluate_intexp(left, state, packet)?;
    let right_val = evaluate_intexp(right, state, packet)?;
    match op {
        ArithOp::Cast => Ok(SizedInt::new(right_val.value, left_val.value as u32)),
        ArithOp::Plus => left_val.add(&right_val),
        ArithOp::Minus => left_val.sub(&right_val),
        ArithOp::LShift => Ok(left_val.shl(&right_val)),
        ArithOp::RShift => Ok(left_val.shr(&right_val)),
    }
}

/// Evaluate an integer expression in the current state.
pub fn evaluate_intexp(intexp: &IntExp, state: &MachineState, packet: &BitVector) -> Result<SizedInt> {
    match intexp {
        IntExp::Const(n) => Ok(*n),
        IntExp::Location(locexp) => {
            let loc = evaluate_locexp(locexp, state, packet)?;
            let bits = read_location(&loc, state, packet)?;
            Ok(SizedInt::new(bits.to_uint(), loc.length() as u32))
        }
        IntExp::Arith(arith) => evaluate_op(arith.op, &arith.left, &arith.right, state, packet),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DataStore;
    use std::collections::HashMap;

    fn state_with_store(name: &str, width: usize) -> MachineState {
        let mut stores = HashMap::new();
        stores.insert(name.to_string(), DataStore::new_zeroed(width, true, true, false, false));
        MachineState::new(stores, vec![])
    }

    #[test]
    fn const_evaluates_to_itself() {
        let state = MachineState::new(HashMap::new(), vec![]);
        let packet = BitVector::new_zeroed(0);
        let result = evaluate_intexp(&IntExp::Const(SizedInt::new(7, 32)), &state, &packet).unwrap();
        assert_eq!(result, SizedInt::new(7, 32));
    }

    #[test]
    fn location_reads_from_packet_relative_to_cursor() {
        let mut state = MachineState::new(HashMap::new(), vec![]);
        state.cursor = 8;
        let packet = BitVector::new_from_literal("0xF00F").unwrap();
        let locexp = LocationExp::new(PACKET, IntExp::Const(SizedInt::new(0, 32)), IntExp::Const(SizedInt::new(7, 32)));
        let result = evaluate_intexp(&IntExp::Location(locexp), &state, &packet).unwrap();
        assert_eq!(result, SizedInt::new(0x0F, 8));
    }

    #[test]
    fn location_read_past_packet_end_fails() {
        let state = MachineState::new(HashMap::new(), vec![]);
        let packet = BitVector::new_from_literal("0xFF").unwrap();
        let locexp = LocationExp::new(PACKET, IntExp::Const(SizedInt::new(0, 32)), IntExp::Const(SizedInt::new(15, 32)));
        assert!(evaluate_intexp(&IntExp::Location(locexp), &state, &packet).is_err());
    }

    #[test]
    fn read_from_non_readable_store_fails() {
        let mut stores = HashMap::new();
        stores.insert("r0".to_string(), DataStore::new_zeroed(8, false, true, false, false));
        let state = MachineState::new(stores, vec![]);
        let packet = BitVector::new_zeroed(0);
        let locexp = LocationExp::new("r0", IntExp::Const(SizedInt::new(0, 32)), IntExp::Const(SizedInt::new(7, 32)));
        assert!(evaluate_intexp(&IntExp::Location(locexp), &state, &packet).is_err());
    }

    #[test]
    fn read_from_unknown_store_fails() {
        let state = MachineState::new(HashMap::new(), vec![]);
        let packet = BitVector::new_zeroed(0);
        let locexp = LocationExp::new("nope", IntExp::Const(SizedInt::new(0, 32)), IntExp::Const(SizedInt::new(7, 32)));
        assert!(evaluate_intexp(&IntExp::Location(locexp), &state, &packet).is_err());
    }

    #[test]
    fn cast_uses_left_value_as_target_width() {
        let state = state_with_store("r0", 8);
        let packet = BitVector::new_zeroed(0);
        let result = evaluate_op(
            ArithOp::Cast,
            &IntExp::Const(SizedInt::new(4, 32)),
            &IntExp::Const(SizedInt::new(0b1111_0000, 8)),
            &state,
            &packet,
        )
        .unwrap();
        assert_eq!(result, SizedInt::new(0, 4));
    }

    #[test]
    fn locexp_with_inverted_bounds_fails() {
        let state = MachineState::new(HashMap::new(), vec![]);
        let packet = BitVector::new_zeroed(0);
        let locexp = LocationExp::new(PACKET, IntExp::Const(SizedInt::new(10, 32)), IntExp::Const(SizedInt::new(2, 32)));
        assert!(evaluate_locexp(&locexp, &state, &packet).is_err());
    }
}
