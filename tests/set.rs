use fixedstr::zstr;
use warren::{Error, HashSet};

#[test]
fn insert_contains_remove() {
    let mut set = HashSet::with_capacity(64).unwrap();
    let key: zstr<17> = zstr::make("Answer");
    assert!(set.insert(key));
    assert!(set.contains(&key));
    assert!(!set.insert(key));
    assert_eq!(set.len(), 1);
    assert!(set.remove(&key));
    assert!(!set.remove(&key));
    assert!(set.is_empty());
}

#[test]
fn borrowed_lookups() {
    let mut set = HashSet::<String>::with_capacity(16).unwrap();
    assert!(set.insert("hello".to_owned()));
    assert!(set.contains("hello"));
    assert_eq!(set.get("hello").map(String::as_str), Some("hello"));
    assert_eq!(set.take("hello"), Some("hello".to_owned()));
    assert_eq!(set.take("hello"), None);
}

#[test]
fn insert_many_and_iterate() {
    let mut set = HashSet::<u64>::with_capacity(4).unwrap();
    for i in 0..10_000 {
        assert!(set.insert(i));
    }
    assert_eq!(set.len(), 10_000);
    assert_eq!(set.iter().count(), 10_000);
    let sum: u64 = set.iter().sum();
    assert_eq!(sum, 9_999 * 10_000 / 2);
}

#[test]
fn retain_keeps_matching_values() {
    let mut set: HashSet<u32> = (0..100).collect();
    set.retain(|value| value % 2 == 0);
    assert_eq!(set.len(), 50);
    assert!(set.iter().all(|value| value % 2 == 0));
}

#[test]
fn merge_absorbs_missing_values() {
    let mut left: HashSet<u32> = (0..10).collect();
    let right: HashSet<u32> = (5..15).collect();
    left.merge(&right);
    assert_eq!(left.len(), 15);
    for value in 0..15 {
        assert!(left.contains(&value));
    }
    assert_eq!(right.len(), 10);
}

#[test]
fn clear_and_reuse() {
    let mut set: HashSet<u32> = (0..50).collect();
    set.clear();
    assert!(set.is_empty());
    assert!(set.insert(7));
    assert_eq!(set.len(), 1);
}

#[test]
fn construction_errors() {
    assert!(matches!(
        HashSet::<u64>::with_capacity(0),
        Err(Error::InvalidArgument(_))
    ));
    let mut set = HashSet::<u64>::with_capacity(8).unwrap();
    assert!(set.set_max_load_factor(2.0).is_err());
}

#[test]
fn debug_formats_as_a_set() {
    let mut set = HashSet::<u32>::with_capacity(8).unwrap();
    set.insert(5);
    assert_eq!(format!("{set:?}"), "{5}");
}
