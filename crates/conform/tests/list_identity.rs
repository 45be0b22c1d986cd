use conform::intent::{self, apply_list_intent, Intent, ListIntent, ListOperation, MAX_TRAILING_ITEMS};
use conform::{parse_with, ConformError, FormConfig, FormData, FormValue, Resolution, SubmissionState};
use conform_util::SequentialKeys;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn keyed_list(len: usize) -> (FormValue, SubmissionState) {
    let items = (0..len).map(|i| FormValue::from(format!("v{i}"))).collect();
    let mut state = SubmissionState::default();
    for i in 0..len {
        state.key.insert(format!("items[{i}]"), format!("k{i}"));
    }
    (FormValue::object([("items".to_string(), FormValue::array(items))]), state)
}

fn list(intent: Intent) -> ListIntent {
    match intent {
        Intent::List(list) => list,
        other => panic!("not a list intent: {other:?}"),
    }
}

fn keys_in_order(state: &SubmissionState, len: usize) -> Vec<Option<String>> {
    (0..len).map(|i| state.key.get(&format!("items[{i}]")).cloned()).collect()
}

#[test]
fn remove_keeps_the_remaining_keys_in_order() {
    let (mut payload, mut state) = keyed_list(3);
    apply_list_intent(&mut payload, &mut state, &list(intent::remove("items", 0)), &mut SequentialKeys::new("n")).unwrap();
    assert_eq!(keys_in_order(&state, 2), [Some("k1".into()), Some("k2".into())]);
    assert!(!state.key.contains_key("items[2]"));
    assert_eq!(payload.to_json(), json!({"items": ["v1", "v2"]}));
}

#[test]
fn reorder_moves_the_key_with_the_item() {
    let (mut payload, mut state) = keyed_list(3);
    apply_list_intent(&mut payload, &mut state, &list(intent::reorder("items", 0, 2)), &mut SequentialKeys::new("n")).unwrap();
    assert_eq!(
        keys_in_order(&state, 3),
        [Some("k1".into()), Some("k2".into()), Some("k0".into())]
    );
    assert_eq!(payload.to_json(), json!({"items": ["v1", "v2", "v0"]}));
}

#[test]
fn insert_clears_validation_and_assigns_a_fresh_key() {
    let mut payload = FormValue::from(json!({"items": ["old"]}));
    let mut state = SubmissionState::default();
    state.validated.insert("items[0]".into(), true);
    state.key.insert("items[0]".into(), "k0".into());

    let change = apply_list_intent(
        &mut payload,
        &mut state,
        &list(intent::insert("items", Some("new".into()), Some(0))),
        &mut SequentialKeys::new("fresh"),
    )
    .unwrap();

    assert_eq!(change.introduced, Some(0));
    assert_eq!(payload.to_json(), json!({"items": ["new", "old"]}));
    assert!(!state.validated.contains_key("items[0]"));
    assert_eq!(state.key.get("items[0]").map(String::as_str), Some("fresh0"));
    assert!(state.is_validated("items[1]"));
    assert_eq!(state.key.get("items[1]").map(String::as_str), Some("k0"));
    assert!(state.is_validated("items"));
}

#[test]
fn replace_refreshes_identity_of_the_slot() {
    let (mut payload, mut state) = keyed_list(2);
    state.validated.insert("items[1].title".into(), true);
    apply_list_intent(
        &mut payload,
        &mut state,
        &list(intent::replace("items", "x".into(), 1)),
        &mut SequentialKeys::new("n"),
    )
    .unwrap();
    assert_eq!(keys_in_order(&state, 2), [Some("k0".into()), Some("n0".into())]);
    assert!(!state.validated.contains_key("items[1].title"));
}

#[test]
fn nested_state_follows_its_item() {
    let mut payload = FormValue::from(json!({"items": [{"title": "a"}, {"title": "b"}, {"title": "c"}]}));
    let mut state = SubmissionState::default();
    state.validated.insert("items[2].title".into(), true);
    state.validated.insert("other".into(), true);
    apply_list_intent(&mut payload, &mut state, &list(intent::remove("items", 0)), &mut SequentialKeys::new("n")).unwrap();
    assert!(state.is_validated("items[1].title"));
    assert!(!state.validated.contains_key("items[2].title"));
    assert!(state.is_validated("other"));
}

#[test]
fn prepend_and_append_on_a_missing_list() {
    let mut payload = FormValue::empty_object();
    let mut state = SubmissionState::default();
    let mut keys = SequentialKeys::new("k");
    apply_list_intent(&mut payload, &mut state, &list(intent::append("items", Some("b".into()))), &mut keys).unwrap();
    apply_list_intent(&mut payload, &mut state, &list(intent::prepend("items", Some("a".into()))), &mut keys).unwrap();
    assert_eq!(payload.to_json(), json!({"items": ["a", "b"]}));
    assert_eq!(keys_in_order(&state, 2), [Some("k1".into()), Some("k0".into())]);
}

#[test]
fn unknown_operation_on_the_wire_is_fatal() {
    let err = Intent::parse(r#"list/{"name":"items","operation":"swap","from":0,"to":1}"#).unwrap_err();
    assert!(matches!(err, ConformError::UnknownListOperation(_)));
}

#[test]
fn overflowing_state_index_is_rejected() {
    let mut data = FormData::from_urlencoded("items%5B0%5D=a");
    data.append("__intent__", intent::remove("items", 0).serialize());
    data.append("__state__", r#"{"key":{"items[18446744073709551615]":"x"}}"#);
    let result = parse_with(
        &data,
        &FormConfig::default(),
        |payload: &FormValue| Resolution::valid(payload.clone()),
        &mut SequentialKeys::new("n"),
    );
    assert!(matches!(result, Err(ConformError::Path(_))));
}

#[test]
fn distant_state_does_not_grow_the_list() {
    let (mut payload, mut state) = keyed_list(1);
    state.key.insert("items[4000].title".into(), "far".into());
    state.validated.insert("items[9999]".into(), true);
    state.key.insert(format!("items[{}]", MAX_TRAILING_ITEMS), "edge".into());

    let change = apply_list_intent(
        &mut payload,
        &mut state,
        &list(intent::append("items", None)),
        &mut SequentialKeys::new("n"),
    )
    .unwrap();

    assert_eq!(change.len, 1 + MAX_TRAILING_ITEMS);
    assert_eq!(payload.as_object().unwrap()["items"].as_array().unwrap().len(), 2 + MAX_TRAILING_ITEMS);
    assert!(state.key.keys().all(|name| !name.contains("4000")));
    assert!(!state.validated.contains_key("items[9999]"));
    assert_eq!(state.key.get(&format!("items[{}]", MAX_TRAILING_ITEMS)).map(String::as_str), Some("edge"));
}

fn operation() -> impl Strategy<Value = ListOperation> {
    prop_oneof![
        Just(ListOperation::Prepend { default_value: None }),
        Just(ListOperation::Append { default_value: None }),
        (0usize..6).prop_map(|i| ListOperation::Insert { default_value: None, index: Some(i) }),
        (0usize..6).prop_map(|i| ListOperation::Replace { default_value: FormValue::Null, index: i }),
        (0usize..6).prop_map(|index| ListOperation::Remove { index }),
        (0usize..6, 0usize..6).prop_map(|(from, to)| ListOperation::Reorder { from, to }),
    ]
}

proptest! {
    /// Keys stay attached to the values they were created with, whatever
    /// sequence of operations runs.
    #[test]
    fn keys_follow_values(ops in prop::collection::vec(operation(), 1..12)) {
        let (mut payload, mut state) = keyed_list(3);
        let mut keys = SequentialKeys::new("n");
        let mut serial = 0;
        for op in ops {
            // Tag every introduced item with a value that names its key.
            let default_value = Some(FormValue::from(format!("n{serial}")));
            let op = match op {
                ListOperation::Prepend { .. } => ListOperation::Prepend { default_value },
                ListOperation::Append { .. } => ListOperation::Append { default_value },
                ListOperation::Insert { index, .. } => ListOperation::Insert { default_value, index },
                ListOperation::Replace { index, .. } => ListOperation::Replace {
                    default_value: FormValue::from(format!("n{serial}")),
                    index,
                },
                other => other,
            };
            if op.default_value().is_some() {
                serial += 1;
            }
            let intent = ListIntent { name: "items".into(), operation: op };
            apply_list_intent(&mut payload, &mut state, &intent, &mut keys).unwrap();
        }

        let items = payload.as_object().unwrap()["items"].as_array().unwrap().to_vec();
        for (i, item) in items.iter().enumerate() {
            let key = state.key.get(&format!("items[{i}]")).cloned();
            let expected = item.as_str().map(|v| v.replacen('v', "k", 1));
            prop_assert_eq!(key, expected);
        }
        prop_assert_eq!(state.key.len(), items.len());
    }
}
