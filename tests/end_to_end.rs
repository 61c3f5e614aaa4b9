//! End-to-end tests driving the full loader → evaluator pipeline against a
//! reference Ethernet/IPv4/IPv6 parser: an Ethernet header dispatches on
//! ethertype to either an IPv4 or an IPv6 stage; the IPv4 stage further
//! accepts or rejects based on the source address.

use pretty_assertions::assert_eq;
use tcamterp::{ast::MachineState, bitvector::BitVector, config, eval, ir};

const IR_JSON: &str = include_str!("fixtures/ethernet_ipv4_ipv6_ir.json");
const CONFIG_JSON: &str = include_str!("fixtures/ethernet_ipv4_ipv6_config.json");

const ETH_LEN: u64 = 112;
const IPV4_LEN: u64 = 160;
const IPV6_LEN: u64 = 320;

const ACCEPT: u128 = 99;
const REJECT: u128 = 100;

fn mk_eth(ethertype: &str) -> String {
    format!("123456654321abcdeffedcba{}", ethertype)
}

fn mk_ipv4(src: &str) -> String {
    format!("05112233445566778899aabb{}ccddeeff", src)
}

fn mk_ipv6() -> String {
    "1111222233334444fedcba9876543210ffeeddccbbaa988855556666777788889999aaaabbbbcccc".to_string()
}

fn run(packet_hex: &str) -> MachineState {
    let ir_value: serde_json::Value = serde_json::from_str(IR_JSON).unwrap();
    let config_value: serde_json::Value = serde_json::from_str(CONFIG_JSON).unwrap();
    let tcam = ir::parse_ir(&ir_value).unwrap();
    let mut state = config::parse_config(&config_value).unwrap();
    let packet = BitVector::new_from_literal(&format!("0x{}", packet_hex)).unwrap();

    eval::validate_keys_patterns(&tcam, &state).unwrap();
    eval::interp_tcam(&tcam, &mut state, &packet).unwrap();
    state
}

#[test]
fn ipv4_good_address_is_accepted() {
    let packet = format!("{}{}", mk_eth("0800"), mk_ipv4("76543210"));
    let state = run(&packet);

    assert_eq!(state.cursor, ETH_LEN + IPV4_LEN);
    assert_eq!(state.stage, 3);
    assert_eq!(state.headers().len(), 2);
    assert!(state.header("hdr.ethernet").is_some());
    assert!(state.header("hdr.ipv4").is_some());
    assert_eq!(state.stores["state"].value.to_uint(), ACCEPT);
}

#[test]
fn ipv4_bad_address_is_rejected() {
    let packet = format!("{}{}", mk_eth("0800"), mk_ipv4("7f000001"));
    let state = run(&packet);

    assert_eq!(state.cursor, ETH_LEN + IPV4_LEN);
    assert_eq!(state.stage, 3);
    let expected_ipv4 = BitVector::new_from_literal(&format!("0x{}", mk_ipv4("7f000001"))).unwrap();
    assert_eq!(state.header("hdr.ipv4").unwrap(), &expected_ipv4);
    assert_eq!(state.stores["state"].value.to_uint(), REJECT);
}

#[test]
fn ipv6_packet_is_accepted() {
    let packet = format!("{}{}", mk_eth("86dd"), mk_ipv6());
    let state = run(&packet);

    assert_eq!(state.cursor, ETH_LEN + IPV6_LEN);
    assert_eq!(state.stage, 3);
    assert_eq!(state.headers().len(), 2);
    assert!(state.header("hdr.ipv6").is_some());
    assert_eq!(state.stores["state"].value.to_uint(), ACCEPT);
}

#[test]
fn nonsense_packet_only_advances_through_the_ethernet_stage() {
    let packet = format!("{}{}{}", mk_ipv6(), mk_ipv4("76543210"), mk_eth("0800"));
    let state = run(&packet);

    assert_eq!(state.cursor, ETH_LEN);
    assert_eq!(state.stage, 3);
    assert_eq!(state.headers().len(), 1);
    assert!(state.header("hdr.ethernet").is_some());
    assert_eq!(state.stores["state"].value.to_uint(), 1);
}
