//! Snapshot tests for wire format stability.
//!
//! Peers written against the line protocol depend on the exact field names,
//! the `type` tags, and hex encoding. If any of these change, these tests
//! fail.

use insta::assert_snapshot;
use proptest::prelude::*;
use tpmkey_proto::{
    Challenge, Record, RecordError, RoundInput, SessionResult, Spin, TagResponse, TauReport,
    Telemetry, decode_line, encode_line,
};

fn to_json(record: &Record) -> String {
    serde_json::to_string(record).expect("encoding should succeed")
}

#[test]
fn snapshot_round_input() {
    let record = Record::X(RoundInput {
        x: vec![vec![Spin::Plus, Spin::Minus], vec![Spin::Minus, Spin::Plus]],
        round: 7,
    });

    assert_snapshot!(to_json(&record), @r#"{"type":"x","x":[[1,-1],[-1,1]],"round":7}"#);
}

#[test]
fn snapshot_tau() {
    let record = Record::Tau(TauReport { tau: Spin::Minus, round: 7 });

    assert_snapshot!(to_json(&record), @r#"{"type":"tau","tau":-1,"round":7}"#);
}

#[test]
fn snapshot_probe() {
    let record = Record::Probe(Challenge { nonce: [0xab; 16] });

    assert_snapshot!(to_json(&record), @r#"{"type":"probe","nonce":"abababababababababababababababab"}"#);
}

#[test]
fn snapshot_mac_resp() {
    let record = Record::MacResp(TagResponse { tag: [0x01; 32] });

    assert_snapshot!(to_json(&record), @r#"{"type":"mac_resp","tag":"0101010101010101010101010101010101010101010101010101010101010101"}"#);
}

#[test]
fn snapshot_result() {
    let record =
        Record::Outcome(SessionResult { ok: true, rounds: 12, key_hex: "00ff".to_string() });

    assert_snapshot!(to_json(&record), @r#"{"type":"result","ok":true,"rounds":12,"key_hex":"00ff"}"#);
}

#[test]
fn snapshot_tele_hash_only() {
    let record = Record::Tele(Telemetry { round: 3, key8: "0123abcd".to_string(), w: None });

    assert_snapshot!(to_json(&record), @r#"{"type":"tele","round":3,"key8":"0123abcd"}"#);
}

#[test]
fn snapshot_tele_with_weights() {
    let record = Record::Tele(Telemetry {
        round: 3,
        key8: "0123abcd".to_string(),
        w: Some(vec![vec![1, -2], vec![3, 0]]),
    });

    assert_snapshot!(to_json(&record), @r#"{"type":"tele","round":3,"key8":"0123abcd","w":[[1,-2],[3,0]]}"#);
}

#[test]
fn decodes_records_from_other_implementations() {
    // Key order and extra whitespace are not significant.
    let line = br#"{ "round": 2, "tau": 1, "type": "tau" }"#;
    let record = decode_line(line).expect("decode");
    assert_eq!(record, Record::Tau(TauReport { tau: Spin::Plus, round: 2 }));

    let line = br#"{"type":"probe_resp","tag":"ABABABABABABABABABABABABABABABABABABABABABABABABABABABABABABABAB"}"#;
    let record = decode_line(line).expect("decode");
    assert_eq!(record, Record::ProbeResp(TagResponse { tag: [0xab; 32] }));
}

#[test]
fn rejects_wrong_nonce_length() {
    let line = br#"{"type":"mac_chal","nonce":"abcd"}"#;
    assert!(matches!(decode_line(line), Err(RecordError::Decode { .. })));
}

#[test]
fn rejects_zero_tau() {
    let line = br#"{"type":"tau","tau":0,"round":1}"#;
    assert!(matches!(decode_line(line), Err(RecordError::Decode { .. })));
}

#[test]
fn rejects_non_spin_input_value() {
    let line = br#"{"type":"x","x":[[1,0]],"round":1}"#;
    assert!(matches!(decode_line(line), Err(RecordError::Decode { .. })));
}

#[test]
fn tele_with_off_type_fields_still_decodes() {
    let lines: [&[u8]; 3] = [
        br#"{"type":"tele","round":-1,"key8":"0123abcd"}"#,
        br#"{"type":"tele","round":3,"key8":null}"#,
        br#"{"type":"tele","round":3,"key8":"0123abcd","w":[[1.0,2]]}"#,
    ];

    for line in lines {
        let record = decode_line(line).expect("tele must decode");
        assert!(record.is_diagnostic());
    }

    let record = decode_line(lines[2]).expect("decode");
    assert_eq!(
        record,
        Record::Tele(Telemetry { round: 3, key8: "0123abcd".to_string(), w: None })
    );
}

#[test]
fn tele_that_is_not_json_is_rejected() {
    let line = br#"{"type":"tele","round":"#;
    assert!(matches!(decode_line(line), Err(RecordError::Decode { .. })));
}

#[test]
fn prop_decode_never_panics() {
    proptest!(|(bytes in proptest::collection::vec(any::<u8>(), 0..512))| {
        let _ = decode_line(&bytes);
    });
}

#[test]
fn prop_tau_survives_framing() {
    proptest!(|(round in any::<u64>(), plus in any::<bool>())| {
        let record = Record::Tau(TauReport { tau: Spin::from_bit(plus), round });
        let line = encode_line(&record).expect("encode");
        prop_assert_eq!(decode_line(&line).expect("decode"), record);
    });
}
