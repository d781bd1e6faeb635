//! Property-based tests for the AgentHub SDK.

use proptest::prelude::*;

use agenthub_sdk::SearchParams;

proptest! {
    /// Every set filter appears exactly once and parses back to its value.
    #[test]
    fn test_search_query_carries_set_filters(
        skill in proptest::option::of("[a-z_]{1,20}"),
        max_price in proptest::option::of(0.0f64..1_000.0),
        min_score in proptest::option::of(0.0f64..=1.0),
    ) {
        let params = SearchParams { skill: skill.clone(), max_price, min_score };
        let query = params.to_query();

        let expected = usize::from(skill.is_some())
            + usize::from(max_price.is_some())
            + usize::from(min_score.is_some());
        prop_assert_eq!(query.len(), expected);

        for (key, value) in &query {
            match *key {
                "skill" => prop_assert_eq!(Some(value.clone()), skill.clone()),
                "max_price" => prop_assert_eq!(value.parse::<f64>().ok(), max_price),
                "min_score" => prop_assert_eq!(value.parse::<f64>().ok(), min_score),
                other => prop_assert!(false, "unexpected key {}", other),
            }
        }
    }
}
