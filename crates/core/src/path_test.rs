//! Tests for the payload path engine

use super::*;
use crate::error::PathError;
use serde_json::json;

fn payload(value: serde_json::Value) -> Payload {
    Payload::from(value)
}

#[test]
fn test_find_in_map_no_sequences() {
    let p = payload(json!({"foo": "bar", "fizz": {"buzz": 133}}));
    assert_eq!(find_in_payload(&p, "fizz.buzz"), Ok(&Payload::Int(133)));
}

#[test]
fn test_find_terminal_sequence_element() {
    let p = payload(json!({"foo": "bar", "fizz": ["buzz", "bazz"]}));
    assert_eq!(find_in_payload(&p, "fizz.1"), Ok(&Payload::from("bazz")));
}

#[test]
fn test_find_through_sequence() {
    let p = payload(json!({
        "foo": "bar",
        "fizz": [{"buzz": 33}, {"buzz": 33, "bazz": 44}],
    }));
    assert_eq!(find_in_payload(&p, "fizz.1.bazz"), Ok(&Payload::Int(44)));
}

#[test]
fn test_find_through_sequence_from_sequence_root() {
    let p = payload(json!([
        {"foo": "bar", "fizz": [{"buzz": 33}, {"buzz": 33, "bazz": 44}]},
        "lorem",
    ]));
    assert_eq!(find_in_payload(&p, "0.fizz.1.bazz"), Ok(&Payload::Int(44)));
}

#[test]
fn test_find_on_sequence_root() {
    let p = payload(json!([{"foo": "bar"}, "lorem"]));
    assert_eq!(find_in_payload(&p, "1"), Ok(&Payload::from("lorem")));
}

#[test]
fn test_find_descends_into_primitive_misses() {
    let p = payload(json!([{"foo": "bar"}, "lorem"]));
    assert_eq!(
        find_in_payload(&p, "1.fizz.1.bazz"),
        Err(PathError::NoSuchField)
    );
}

#[test]
fn test_find_out_of_range_index_misses() {
    let p = payload(json!({"fizz": ["buzz"]}));
    assert_eq!(find_in_payload(&p, "fizz.1"), Err(PathError::NoSuchField));
}

#[test]
fn test_find_non_integer_segment_against_sequence_misses() {
    let p = payload(json!({"fizz": ["buzz"]}));
    assert_eq!(find_in_payload(&p, "fizz.buzz"), Err(PathError::NoSuchField));
}

#[test]
fn test_find_leading_zero_index() {
    let p = payload(json!(["a", "b"]));
    assert_eq!(find_in_payload(&p, "01"), Ok(&Payload::from("b")));
}

#[test]
fn test_put_extends_sequence_with_null_fillers() {
    let p = payload(json!({"foo": "bar", "fizz": ["buzz", "bizz"]}));
    let got = put_in_payload(p, "fizz.3", Payload::Int(1337)).unwrap();
    assert_eq!(
        got,
        payload(json!({"foo": "bar", "fizz": ["buzz", "bizz", null, 1337]}))
    );
}

#[test]
fn test_put_mapping_value_into_extended_sequence() {
    let p = payload(json!({"foo": "bar", "fizz": ["buzz", "bizz"]}));
    let got = put_in_payload(p, "fizz.3", payload(json!({"leet": 1337}))).unwrap();
    assert_eq!(
        got,
        payload(json!({"foo": "bar", "fizz": ["buzz", "bizz", null, {"leet": 1337}]}))
    );
}

#[test]
fn test_put_updates_key_through_sequence() {
    let p = payload(json!({"foo": "bar", "fizz": ["buzz", "bizz", null, {"leet": 1337}]}));
    let got = put_in_payload(p, "fizz.3.leet", Payload::from("xxxx")).unwrap();
    assert_eq!(
        got,
        payload(json!({"foo": "bar", "fizz": ["buzz", "bizz", null, {"leet": "xxxx"}]}))
    );
}

#[test]
fn test_put_replaces_node_without_merge() {
    let p = payload(json!({"foo": "bar", "fizz": ["buzz", "bizz", null, {"leet": 1337}]}));
    let got = put_in_payload(p, "fizz.3", Payload::from("xxxx")).unwrap();
    assert_eq!(
        got,
        payload(json!({"foo": "bar", "fizz": ["buzz", "bizz", null, "xxxx"]}))
    );
}

#[test]
fn test_put_non_integer_segment_against_sequence_fails() {
    let p = payload(json!({"foo": "bar", "fizz": ["buzz", "bizz"]}));
    assert_eq!(
        put_in_payload(p, "fizz.buzz", Payload::Int(1337)),
        Err(PathError::InvalidPath)
    );
}

#[test]
fn test_put_through_primitive_fails() {
    let p = payload(json!({"foo": "bar", "fizz": ["buzz", "bizz"]}));
    assert_eq!(
        put_in_payload(p, "foo.0", Payload::Int(1337)),
        Err(PathError::InvalidPath)
    );
}

#[test]
fn test_put_into_null_root_with_integer_first_segment() {
    let got = put_in_payload(Payload::Null, "0.fizz.3.buzz", Payload::Int(1337)).unwrap();
    assert_eq!(
        got,
        payload(json!([{"fizz": [null, null, null, {"buzz": 1337}]}]))
    );
}

#[test]
fn test_put_into_null_root_with_key_first_segment() {
    let got = put_in_payload(Payload::Null, "fizz.buzz", Payload::Int(1337)).unwrap();
    assert_eq!(got, payload(json!({"fizz": {"buzz": 1337}})));
}

#[test]
fn test_put_integer_looking_segment_is_a_key_against_mapping() {
    let p = payload(json!({"0": "zero"}));
    let got = put_in_payload(p, "0", Payload::from("replaced")).unwrap();
    assert_eq!(got, payload(json!({"0": "replaced"})));
}

#[test]
fn test_put_empty_path_fails() {
    assert_eq!(
        put_in_payload(Payload::Null, "", Payload::Int(1)),
        Err(PathError::InvalidPath)
    );
}

#[test]
fn test_try_put_returns_payload_untouched_on_failure() {
    let p = payload(json!({"foo": "bar", "fizz": ["buzz", "bizz"]}));
    let (back, err) = try_put(p.clone(), "fizz.buzz.deep", Payload::Int(1)).unwrap_err();
    assert_eq!(err, PathError::InvalidPath);
    assert_eq!(back, p);
}

#[test]
fn test_delete_map_entry_through_sequence() {
    let p = payload(json!({"foo": "bar", "fizz": ["buzz", "bizz", null, {"leet": 1337}]}));
    let got = delete_from_payload(p, "fizz.3.leet").unwrap();
    assert_eq!(
        got,
        payload(json!({"foo": "bar", "fizz": ["buzz", "bizz", null, {}]}))
    );
}

#[test]
fn test_delete_sequence_element_shifts_tail() {
    let p = payload(json!({"foo": "bar", "fizz": ["buzz", "bizz", null, {"leet": 1337}]}));
    let got = delete_from_payload(p, "fizz.3").unwrap();
    assert_eq!(got, payload(json!({"foo": "bar", "fizz": ["buzz", "bizz", null]})));
}

#[test]
fn test_delete_splices_middle_of_sequence() {
    let p = payload(json!([{"fizz": [null, null, null, {"buzz": 1337}]}]));
    let got = delete_from_payload(p, "0.fizz.2").unwrap();
    assert_eq!(got, payload(json!([{"fizz": [null, null, {"buzz": 1337}]}])));
}

#[test]
fn test_delete_out_of_range_index_misses() {
    let p = payload(json!({"foo": "bar", "fizz": ["buzz", "bizz", null, {"leet": 1337}]}));
    assert_eq!(
        delete_from_payload(p, "fizz.5.bazz"),
        Err(PathError::NoSuchField)
    );
}

#[test]
fn test_delete_missing_key_misses() {
    let p = payload(json!({"foo": "bar"}));
    assert_eq!(delete_from_payload(p, "bar"), Err(PathError::NoSuchField));
}

#[test]
fn test_try_delete_returns_payload_untouched_on_failure() {
    let p = payload(json!({"fizz": [{"a": 1}, {"b": 2}]}));
    let (back, err) = try_delete(p.clone(), "fizz.1.missing").unwrap_err();
    assert_eq!(err, PathError::NoSuchField);
    assert_eq!(back, p);
}

// round-trip properties over a grab bag of shapes

#[test]
fn test_put_then_find_returns_put_value() {
    let shapes = [
        (payload(json!(null)), "a.b.c"),
        (payload(json!({"x": 1})), "x"),
        (payload(json!({"x": [1, 2]})), "x.5"),
        (payload(json!([[1], [2]])), "1.0"),
        (payload(json!({"deep": {"deeper": {}}})), "deep.deeper.leaf"),
    ];
    for (p, key) in shapes {
        let got = put_in_payload(p, key, Payload::Int(77)).unwrap();
        assert_eq!(find_in_payload(&got, key), Ok(&Payload::Int(77)), "key {key}");
    }
}

#[test]
fn test_put_found_value_back_is_structurally_identity() {
    let p = payload(json!({"foo": "bar", "fizz": [{"buzz": 33}, {"bazz": 44}]}));
    let found = find_in_payload(&p, "fizz.1.bazz").unwrap().clone();
    let got = put_in_payload(p.clone(), "fizz.1.bazz", found).unwrap();
    assert_eq!(got, p);
}

#[test]
fn test_delete_then_find_misses() {
    let p = payload(json!({"foo": "bar", "fizz": [{"buzz": 33}, {"bazz": 44}]}));
    assert!(find_in_payload(&p, "fizz.0.buzz").is_ok());
    let got = delete_from_payload(p, "fizz.0.buzz").unwrap();
    assert_eq!(
        find_in_payload(&got, "fizz.0.buzz"),
        Err(PathError::NoSuchField)
    );
}
