//! Integration tests for field values

use rootstore_foundation::{LtVec, Value};

#[test]
fn conversions() {
    assert_eq!(Value::from(true), Value::Bool(true));
    assert_eq!(Value::from(5_i64).as_int(), Some(5));
    assert_eq!(Value::from("x").as_str(), Some("x"));
    let patterns: LtVec<Value> = [Value::string("*.log")].into_iter().collect();
    assert_eq!(Value::from(patterns.clone()), Value::List(patterns));
    assert!(Value::default().is_nil());
}

#[test]
fn urls_and_strings_are_distinct() {
    assert_ne!(Value::url("file:///a"), Value::string("file:///a"));
    assert_eq!(Value::url("file:///a").type_name(), "url");
}

#[test]
fn display() {
    let list: LtVec<Value> = [Value::Int(1), Value::Bool(false)].into_iter().collect();
    assert_eq!(Value::List(list).to_string(), "[1, false]");
    assert_eq!(Value::url("file:///src").to_string(), "<file:///src>");
}
