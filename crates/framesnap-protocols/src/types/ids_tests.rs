use super::*;
use std::collections::BTreeMap;

#[test]
fn test_composite_key_display() {
    let key = CompositeKey::new(3, 100);
    assert_eq!(key.to_string(), "3-100");
}

#[test]
fn test_composite_key_parse() {
    let key: CompositeKey = "12-4567".parse().unwrap();
    assert_eq!(key.ordinal, 12);
    assert_eq!(key.backend_node_id, BackendNodeId(4567));
}

#[test]
fn test_composite_key_parse_invalid() {
    assert!("100".parse::<CompositeKey>().is_err());
    assert!("a-1".parse::<CompositeKey>().is_err());
    assert!("1-b".parse::<CompositeKey>().is_err());
    assert!("".parse::<CompositeKey>().is_err());
}

#[test]
fn test_same_backend_id_different_ordinal_distinct() {
    let a = CompositeKey::new(0, 100);
    let b = CompositeKey::new(1, 100);
    assert_ne!(a, b);
    assert_ne!(a.to_string(), b.to_string());
}

#[test]
fn test_composite_key_as_json_map_key() {
    let mut map = BTreeMap::new();
    map.insert(CompositeKey::new(1, 7), "/div[1]".to_string());
    map.insert(CompositeKey::new(0, 9), "/html[1]".to_string());

    let json = serde_json::to_string(&map).unwrap();
    assert_eq!(json, r#"{"0-9":"/html[1]","1-7":"/div[1]"}"#);

    let back: BTreeMap<CompositeKey, String> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, map);
}

#[test]
fn test_session_key_fallback() {
    assert_eq!(SessionKey::from_session_id(None).as_str(), ROOT_SESSION_KEY);
    assert_eq!(SessionKey::from_session_id(Some("")).as_str(), ROOT_SESSION_KEY);
    assert!(SessionKey::from_session_id(None).is_root());

    let key = SessionKey::from_session_id(Some("ABC"));
    assert_eq!(key.as_str(), "ABC");
    assert!(!key.is_root());
}

#[test]
fn test_frame_id_serde_transparent() {
    let id = FrameId::new("frame-1");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"frame-1\"");
}
