use proptest::prelude::*;
use sonide::check_name;

proptest! {
    #[test]
    fn check_name_never_panics(s in ".*") {
        let _ = check_name(&s);
    }

    #[test]
    fn pure_integers_are_valid(n in 0u64..=u64::MAX) {
        prop_assert!(check_name(&n.to_string()));
    }

    #[test]
    fn digit_prefixed_names_are_invalid(n in 0u32..1000, tail in "[a-z_]{1,8}") {
        let candidate = format!("{}{}", n, tail);
        prop_assert!(!check_name(&candidate));
    }

    #[test]
    fn identifier_shaped_names_are_valid(s in "[A-Za-z_][A-Za-z0-9_]{0,16}") {
        prop_assert!(check_name(&s));
    }
}
