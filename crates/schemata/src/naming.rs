//! Name generation within a sibling namespace.
//!
//! Names never collide: instead of failing, every generator here picks the
//! first free candidate of a fixed sequence.

/// Returns `name` if it is free, otherwise `name_1`, `name_2`, ...
pub fn unique_name<S: AsRef<str>>(name: &str, taken: &[S]) -> String {
    if is_free(name, taken) {
        return name.to_string();
    }
    (1..)
        .map(|n| format!("{name}_{n}"))
        .find(|candidate| is_free(candidate, taken))
        .unwrap_or_else(|| name.to_string())
}

/// Returns the name a duplicate of `original` gets.
///
/// The original name is kept when it is free (e.g. when pasting into
/// another schema); otherwise `_copy` is appended, then `_copy_1`,
/// `_copy_2`, ...
pub fn copy_name<S: AsRef<str>>(original: &str, taken: &[S]) -> String {
    if is_free(original, taken) {
        return original.to_string();
    }
    unique_name(&format!("{original}_copy"), taken)
}

/// Returns `prefix_N` for the smallest `N >= 1` not yet taken.
pub fn next_default_name<S: AsRef<str>>(prefix: &str, taken: &[S]) -> String {
    (1..)
        .map(|n| format!("{prefix}_{n}"))
        .find(|candidate| is_free(candidate, taken))
        .unwrap_or_else(|| prefix.to_string())
}

fn is_free<S: AsRef<str>>(candidate: &str, taken: &[S]) -> bool {
    !taken.iter().any(|name| name.as_ref() == candidate)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_copy_name_sequence() {
        assert_eq!(copy_name("orders", &["customers"]), "orders");
        assert_eq!(copy_name("orders", &["orders"]), "orders_copy");
        assert_eq!(copy_name("orders", &["orders", "orders_copy"]), "orders_copy_1");
        assert_eq!(
            copy_name("orders", &["orders", "orders_copy", "orders_copy_1"]),
            "orders_copy_2"
        );
    }

    #[test]
    fn test_next_default_name_fills_gaps() {
        let empty: [&str; 0] = [];
        assert_eq!(next_default_name("table", &empty), "table_1");
        assert_eq!(next_default_name("table", &["table_1", "table_3"]), "table_2");
    }

    #[test]
    fn test_unique_name() {
        assert_eq!(unique_name("orders", &["orders", "orders_1"]), "orders_2");
        assert_eq!(unique_name("fresh", &["orders"]), "fresh");
    }

    proptest! {
        #[test]
        fn prop_generated_names_are_free(
            base in "[a-z]{1,8}",
            taken in proptest::collection::vec("[a-z]{1,8}(_copy)?(_[0-9])?", 0..20),
        ) {
            let copy = copy_name(&base, &taken);
            prop_assert!(!taken.contains(&copy));
            let default = next_default_name(&base, &taken);
            prop_assert!(!taken.contains(&default));
            let unique = unique_name(&base, &taken);
            prop_assert!(!taken.contains(&unique));
        }
    }
}
