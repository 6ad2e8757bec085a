use proptest::prelude::*;
use serde_json::{json, Value};

use typeform::field::Extra;
use typeform::options::DeclaredOptions;
use typeform::transformer::Transformers;
use typeform::{builtins as t, path, ChangeKind, FieldOptions, Form, Path, Type};

fn item_keys(form: &Form) -> Vec<String> {
    match form.locals().extra {
        Extra::List { items, .. } => items.into_iter().map(|i| i.key).collect(),
        other => panic!("expected list locals, got {other:?}"),
    }
}

// ------------------------------------------------------------------------- //
// valid values validate

fn leaf_case() -> impl Strategy<Value = (Type, Value)> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(|s| (t::string(), json!(s))),
        any::<i32>().prop_map(|n| (t::number(), json!(n))),
        any::<i32>().prop_map(|n| (t::integer(), json!(n))),
        any::<bool>().prop_map(|b| (t::boolean(), json!(b))),
        any::<i32>().prop_map(|n| (t::any(), json!({"n": n}))),
        Just((t::nil(), Value::Null)),
        proptest::option::of("[a-z]{1,8}").prop_map(|s| (Type::maybe(t::string()), json!(s))),
        proptest::option::of(any::<i16>()).prop_map(|n| (Type::maybe(t::number()), json!(n))),
        prop::sample::select(vec!["red", "green", "blue"]).prop_map(|c| (Type::enums_of(["red", "green", "blue"]), json!(c))),
        (1990i32..2030, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| (t::date(), json!(format!("{y:04}-{m:02}-{d:02}")))),
    ]
}

fn case() -> impl Strategy<Value = (Type, Value)> {
    prop_oneof![
        leaf_case(),
        ("[a-z]{1,8}", proptest::option::of(0u8..120)).prop_map(|(name, age)| {
            let ty = Type::structure([("name", t::string()), ("age", Type::maybe(t::number()))]);
            (ty, json!({"name": name, "age": age}))
        }),
        prop::collection::vec("[a-z]{1,5}", 1..5).prop_map(|xs| (Type::list(t::string()), json!(xs))),
        prop::collection::vec(proptest::option::of(any::<i16>()), 0..4)
            .prop_map(|xs| (Type::maybe(Type::list(Type::maybe(t::number()))), json!(xs))),
    ]
}

proptest! {
    #[test]
    fn members_of_a_type_validate_cleanly((ty, value) in case()) {
        prop_assert!(ty.is(&value));
        let mut form = Form::new(ty, value, FieldOptions::default()).unwrap();
        let r = form.validate();
        prop_assert!(r.is_valid(), "errors: {:?}", r.errors);
        prop_assert!(r.errors.is_empty());
        prop_assert!(!form.root().has_error());
    }

    #[test]
    fn number_and_date_formats_parse_back(n in any::<i64>(), d in 1u32..=28) {
        let table = Transformers::default();
        let v = json!(n);
        prop_assert_eq!(table.number.parse(&table.number.format(&v)), Ok(v));
        let day = json!(format!("2024-02-{d:02}"));
        prop_assert_eq!(table.date.parse(&table.date.format(&day)), Ok(day));
    }
}

// ------------------------------------------------------------------------- //
// absent values stay absent

#[test]
fn optional_text_null_comes_back_null() {
    let ty = Type::structure([("nick", Type::maybe(t::string()))]);
    let mut form = Form::new(ty, json!({"nick": null}), FieldOptions::default()).unwrap();
    assert_eq!(form.get_value(), json!({"nick": null}));
    assert_eq!(form.get_component(&path!["nick"]).unwrap().get_locals().value, json!(""));
    let r = form.validate();
    assert!(r.is_valid(), "{:?}", r.errors);
    assert_eq!(r.value, json!({"nick": null}));

    form.on_change(&path!["nick"], json!("al")).unwrap();
    let change = form.on_change(&path!["nick"], json!("")).unwrap().unwrap();
    assert_eq!(change.value, json!({"nick": null}));
}

// ------------------------------------------------------------------------- //
// no premature validation

#[test]
fn required_field_is_quiet_until_interaction() {
    for interact in ["change", "blur", "validate"] {
        let mut form = Form::new(t::string(), Value::Null, FieldOptions::default()).unwrap();
        assert!(!form.root().has_error(), "{interact}: error before interaction");
        match interact {
            "change" => {
                form.on_change(&Path::root(), json!("")).unwrap();
            }
            "blur" => {
                form.on_blur(&Path::root()).unwrap();
            }
            _ => {
                form.validate();
            }
        }
        assert!(form.root().has_error(), "{interact}: no error after interaction");
    }
}

// ------------------------------------------------------------------------- //
// list identity

#[test]
fn move_up_carries_keys_with_items() {
    let mut form = Form::new(Type::list(t::string()), json!(["a", "b", "c"]), FieldOptions::default()).unwrap();
    let u = item_keys(&form);
    let change = form.move_up(&Path::root(), 1).unwrap().unwrap();
    assert_eq!(change.kind, ChangeKind::MoveUp);
    assert_eq!(form.get_value(), json!(["b", "a", "c"]));
    assert_eq!(item_keys(&form), vec![u[1].clone(), u[0].clone(), u[2].clone()]);

    form.move_down(&Path::root(), 1).unwrap();
    assert_eq!(form.get_value(), json!(["b", "c", "a"]));
    assert_eq!(item_keys(&form), vec![u[1].clone(), u[2].clone(), u[0].clone()]);
}

// ------------------------------------------------------------------------- //
// list emptiness

#[test]
fn required_empty_list_has_one_error_at_its_path() {
    let mut form = Form::new(Type::list(t::string()), json!([]), FieldOptions::default()).unwrap();
    let r = form.validate();
    assert_eq!(r.errors.len(), 1);
    assert_eq!(r.errors[0].path, Path::root());
    assert_eq!(r.errors[0].message, "This field is required");
}

#[test]
fn blank_struct_items_are_validated_not_collapsed() {
    let item = Type::structure([("name", t::string()), ("age", Type::maybe(t::number()))]);
    let mut form = Form::new(Type::list(item), json!([{"name": "", "age": null}]), FieldOptions::default()).unwrap();
    let r = form.validate();
    assert_eq!(r.errors.len(), 1);
    assert_eq!(r.errors[0].path, path![0usize, "name"]);
    assert_eq!(r.errors[0].message, "This field is required");
}

#[test]
fn optional_list_flags_items_not_itself() {
    let ty = Type::maybe(Type::list(t::number()));
    let mut form = Form::new(ty, json!([1, "x"]), FieldOptions::default()).unwrap();
    let r = form.validate();
    assert!(!r.is_valid());
    assert_eq!(r.errors[0].path, path![1usize]);
    assert!(!form.root().has_error());
    assert!(form.get_component(&path![1usize]).unwrap().has_error());
}

#[test]
fn optional_empty_lists_collapse_to_null() {
    for value in [json!([]), json!([null, null])] {
        let ty = Type::maybe(Type::list(t::string()));
        let mut form = Form::new(ty, value.clone(), FieldOptions::default()).unwrap();
        let r = form.validate();
        assert!(r.is_valid(), "{value}: {:?}", r.errors);
        assert_eq!(r.value, Value::Null, "{value}");
    }
}

// ------------------------------------------------------------------------- //
// struct aggregation

#[test]
fn struct_reports_only_the_required_blank_prop() {
    let ty = Type::structure([("name", t::string()), ("age", Type::maybe(t::number()))]);
    let mut form = Form::new(ty, json!({"name": ""}), FieldOptions::default()).unwrap();
    let r = form.validate();
    assert!(!r.is_valid());
    assert_eq!(r.errors.len(), 1);
    assert_eq!(r.errors[0].path, path!["name"]);
}

// ------------------------------------------------------------------------- //
// union dispatch

#[test]
fn union_items_use_the_dispatched_member() {
    let item = Type::union(vec![t::string(), t::boolean()]).with_dispatch(|v| Some(if v.is_boolean() { 1 } else { 0 }));
    let item_options = DeclaredOptions::ByPosition(vec![
        FieldOptions::default().label("Text").into(),
        FieldOptions::default().label("Flag").into(),
    ]);
    let options = FieldOptions::default().item(item_options);
    let mut form = Form::new(Type::list(item), json!(["s", true]), options).unwrap();

    let flag = form.get_component(&path![1usize]).unwrap();
    assert_eq!(flag.component(), "Checkbox");
    assert_eq!(flag.get_locals().label.as_deref(), Some("Flag"));
    assert_eq!(flag.ty().name(), "Boolean");

    let text = form.get_component(&path![0usize]).unwrap();
    assert_eq!(text.component(), "Textbox");
    assert_eq!(text.get_locals().label.as_deref(), Some("Text"));

    assert!(form.validate().is_valid());
}

// ------------------------------------------------------------------------- //
// deferred notification

#[test]
fn error_to_valid_flip_notifies_once_on_a_later_turn() {
    let mut form = Form::new(Type::list(t::string()), json!(["a", ""]), FieldOptions::default()).unwrap();
    assert!(!form.validate().is_valid());
    assert!(form.root().has_error());

    let change = form.on_change(&path![1usize], json!("b")).unwrap().unwrap();
    assert_eq!(change.kind, ChangeKind::ItemChange);
    assert!(!form.root().has_error());

    let delivered = form.run_pending();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].kind, ChangeKind::ValidationStateChange);
    assert_eq!(delivered[0].value, json!(["a", "b"]));

    form.on_change(&path![1usize], json!("c")).unwrap();
    assert!(form.run_pending().is_empty());
}

#[test]
fn notification_follows_its_list_through_a_reorder() {
    let ty = Type::list(Type::list(t::string()));
    let mut form = Form::new(ty, json!([["ok"], [""]]), FieldOptions::default()).unwrap();
    form.validate();
    form.on_change(&path![1usize, 0usize], json!("x")).unwrap();
    assert!(form.has_pending());
    form.move_up(&Path::root(), 1).unwrap();

    let delivered = form.run_pending();
    let paths: Vec<Path> = delivered.iter().map(|c| c.path.clone()).collect();
    assert_eq!(paths, vec![path![0usize], Path::root()]);
    assert!(delivered.iter().all(|c| c.kind == ChangeKind::ValidationStateChange));
    assert!(!form.has_pending());
}

#[test]
fn notification_for_a_removed_list_is_dropped() {
    let ty = Type::list(Type::list(t::string()));
    let mut form = Form::new(ty, json!([["ok"], [""]]), FieldOptions::default()).unwrap();
    form.validate();
    form.on_change(&path![1usize, 0usize], json!("x")).unwrap();
    form.remove(&Path::root(), 1).unwrap();

    let delivered = form.run_pending();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].path, Path::root());
    assert_eq!(delivered[0].value, json!([["ok"]]));
}

#[test]
fn no_flip_no_notification() {
    let mut form = Form::new(Type::list(t::string()), json!(["a"]), FieldOptions::default()).unwrap();
    form.on_change(&path![0usize], json!("y")).unwrap();
    form.on_change(&path![0usize], json!("x")).unwrap();
    form.add(&Path::root()).unwrap();
    assert!(!form.has_pending());
    assert!(form.run_pending().is_empty());
}
