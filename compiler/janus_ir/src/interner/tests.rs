use proptest::prelude::*;

use super::*;

#[test]
fn intern_and_lookup() {
    let interner = StringInterner::new();

    let hello = interner.intern("hello");
    let world = interner.intern("world");
    let hello2 = interner.intern("hello");

    assert_eq!(hello, hello2);
    assert_ne!(hello, world);
    assert_eq!(interner.lookup(hello), "hello");
    assert_eq!(interner.lookup(world), "world");
}

#[test]
fn empty_string_is_name_zero() {
    let interner = StringInterner::new();
    assert_eq!(interner.intern(""), Name::EMPTY);
    assert_eq!(interner.lookup(Name::EMPTY), "");
}

#[test]
fn keywords_are_pre_interned() {
    let interner = StringInterner::new();
    let before = interner.len();
    interner.intern("nursery");
    interner.intern("spawn");
    assert_eq!(interner.len(), before);
    assert!(interner.get("when").is_some());
}

#[test]
fn get_does_not_insert() {
    let interner = StringInterner::new();
    let before = interner.len();
    assert_eq!(interner.get("never_seen_identifier"), None);
    assert_eq!(interner.len(), before);
}

#[test]
fn shared_handles_see_the_same_table() {
    let a = SharedInterner::new();
    let b = a.clone();
    assert!(a.same_session(&b));
    assert_eq!(a.intern("shared"), b.intern("shared"));

    let other = SharedInterner::new();
    assert!(!a.same_session(&other));
}

#[test]
fn concurrent_interning_yields_identical_names() {
    let interner = SharedInterner::new();
    let words: Vec<String> = (0..200).map(|i| format!("ident_{i}")).collect();

    let results: Vec<Vec<Name>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let interner = interner.clone();
                let words = &words;
                scope.spawn(move || words.iter().map(|w| interner.intern(w)).collect::<Vec<_>>())
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_default())
            .collect()
    });

    for names in &results[1..] {
        assert_eq!(names, &results[0]);
    }
    for (word, name) in words.iter().zip(&results[0]) {
        assert_eq!(interner.lookup(*name), word);
    }
}

proptest! {
    #[test]
    fn interning_is_idempotent(text in "[a-zA-Z_][a-zA-Z0-9_]{0,24}") {
        let interner = StringInterner::new();
        let first = interner.intern(&text);
        let second = interner.intern(&text);
        prop_assert_eq!(first, second);
        prop_assert_eq!(interner.lookup(first), text.as_str());
    }
}
