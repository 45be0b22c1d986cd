use conform_path::{parse_path, Segment};
use conform_value::{
    get_value, get_value_by_name, set_value, set_value_cloned, FormValue, SetOptions,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn segment() -> impl Strategy<Value = Segment> {
    prop_oneof![
        "[a-z]{1,4}".prop_map(Segment::Key),
        (0usize..4).prop_map(Segment::Index),
    ]
}

fn leaf() -> impl Strategy<Value = FormValue> {
    "[a-z0-9]{0,6}".prop_map(FormValue::String)
}

proptest! {
    #[test]
    fn get_returns_what_set_wrote(path in prop::collection::vec(segment(), 1..6), value in leaf()) {
        let mut root = FormValue::default();
        set_value(&mut root, &path, value.clone(), SetOptions::default()).unwrap();
        prop_assert_eq!(get_value(&root, &path).unwrap(), Some(&value));
    }

    #[test]
    fn cloned_set_never_mutates_the_source(path in prop::collection::vec(segment(), 1..6), value in leaf()) {
        let mut root = FormValue::default();
        set_value(&mut root, &path, FormValue::from("before"), SetOptions::default()).unwrap();
        let snapshot = root.to_json();
        let next = set_value_cloned(&root, &path, value.clone(), SetOptions::default()).unwrap();
        prop_assert_eq!(root.to_json(), snapshot);
        prop_assert_eq!(get_value(&next, &path).unwrap(), Some(&value));
    }
}

#[test]
fn building_a_submission_tree_by_names() {
    let mut root = FormValue::default();
    for (name, value) in [
        ("email", "a@b.com"),
        ("task[0]", "x"),
        ("task[1].stage[0]", "y"),
    ] {
        set_value(&mut root, &parse_path(name).unwrap(), value.into(), SetOptions::default())
            .unwrap();
    }
    assert_eq!(
        root.to_json(),
        json!({"email": "a@b.com", "task": ["x", {"stage": ["y"]}]})
    );
    assert_eq!(
        get_value_by_name(&root, "task[1].stage").unwrap().map(FormValue::to_json),
        Some(json!(["y"]))
    );
}
