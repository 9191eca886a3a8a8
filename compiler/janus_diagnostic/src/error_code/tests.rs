use super::*;

#[test]
fn test_error_code_display() {
    assert_eq!(ErrorCode::E4001.to_string(), "E4001");
    assert_eq!(ErrorCode::E5003.as_str(), "E5003");
}

#[test]
fn test_parse_round_trips_every_code() {
    for code in ErrorCode::ALL {
        assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(*code));
    }
    assert_eq!("e4102".parse::<ErrorCode>(), Ok(ErrorCode::E4102));
    assert_eq!("E7777".parse::<ErrorCode>(), Err(()));
}

#[test]
fn test_predicate_exclusivity() {
    for code in ErrorCode::ALL {
        let hits = [
            code.is_structural_error(),
            code.is_lowering_error(),
            code.is_resolution_error(),
            code.is_internal_error(),
        ]
        .iter()
        .filter(|&&hit| hit)
        .count();
        assert_eq!(hits, 1, "{code} must belong to exactly one range");
    }
}

#[test]
fn test_descriptions_are_unique() {
    let mut seen = std::collections::HashSet::new();
    for code in ErrorCode::ALL {
        assert!(seen.insert(code.description()), "duplicate text for {code}");
    }
}
