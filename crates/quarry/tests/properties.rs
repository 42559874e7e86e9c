use proptest::prelude::*;
use quarry::{Client, Config, MemoryStore};
use serde_json::json;

fn seeded(years: &[i64]) -> Client<MemoryStore> {
    let client = Client::connect(MemoryStore::new(), Config::default().with_database("db"));
    let docs: Vec<_> = years.iter().map(|y| json!({"year": y})).collect();
    client.query().table("t").create_many(&docs).unwrap();
    client
}

proptest! {
    #[test]
    fn count_agrees_with_get(years in prop::collection::vec(0i64..100, 0..40), pivot in 0i64..100) {
        let client = seeded(&years);
        let query = client.query().table("t").where_greater_than("year", pivot);
        let expected = years.iter().filter(|y| **y > pivot).count();

        prop_assert_eq!(query.count().unwrap() as usize, expected);
        prop_assert_eq!(query.get(0).unwrap().len(), expected);
    }

    #[test]
    fn or_covers_both_sides(years in prop::collection::vec(0i64..100, 0..40), low in 0i64..50, high in 50i64..100) {
        let client = seeded(&years);
        let query = client
            .query()
            .table("t")
            .where_less_than("year", low)
            .or_where_greater_than("year", high);
        let expected = years.iter().filter(|y| **y < low || **y > high).count();
        prop_assert_eq!(query.count().unwrap() as usize, expected);
    }

    #[test]
    fn delete_leaves_the_complement(years in prop::collection::vec(0i64..100, 0..40), pivot in 0i64..100) {
        let client = seeded(&years);
        let removed = client.query().table("t").where_less_than_or_equal("year", pivot).delete().unwrap();
        let remaining = client.query().table("t").count().unwrap();

        prop_assert_eq!(removed + remaining, years.len() as u64);
        prop_assert_eq!(client.query().table("t").where_less_than_or_equal("year", pivot).count().unwrap(), 0);
    }

    #[test]
    fn sorted_results_are_ordered(years in prop::collection::vec(0i64..100, 0..40)) {
        let client = seeded(&years);
        let docs = client.query().table("t").order_by(["year"], "desc").get(0).unwrap();
        let got: Vec<i64> = docs.iter().filter_map(|d| d["year"].as_i64()).collect();
        let mut expected = years.clone();
        expected.sort_unstable_by(|a, b| b.cmp(a));
        prop_assert_eq!(got, expected);
    }
}
