//! Property tests: every valid record dumps back to the data it was loaded from.

use proptest::prelude::*;
use schema_engine::{Field, SchemaType, TypeExpr};
use serde_json::{Map, Value, json};

fn person() -> SchemaType {
    SchemaType::builder("Person")
        .field("name", Field::string())
        .field("age", Field::integer())
        .field("score", Field::float().nullable(true))
        .field("active", Field::boolean())
        .field("tags", Field::list(TypeExpr::Str))
        .field("nick", Field::string().data_key("nickName").required(false))
        .build()
        .expect("Failed to build Person")
}

fn record() -> impl Strategy<Value = Map<String, Value>> {
    (
        "[a-zA-Z ]{0,12}",
        any::<i64>(),
        prop::option::of(-1.0e6f64..1.0e6),
        any::<bool>(),
        prop::collection::vec("[a-z]{1,6}", 0..5),
        prop::option::of("[a-z]{1,8}"),
    )
        .prop_map(|(name, age, score, active, tags, nick)| {
            let mut map = Map::new();
            map.insert("name".into(), json!(name));
            map.insert("age".into(), json!(age));
            map.insert("score".into(), json!(score));
            map.insert("active".into(), json!(active));
            map.insert("tags".into(), json!(tags));
            if let Some(nick) = nick {
                map.insert("nickName".into(), json!(nick));
            }
            map
        })
}

proptest! {
    #[test]
    fn test_load_then_dump_returns_input(data in record()) {
        let schema = person();
        let instance = schema.load(&data).expect("generated record must be valid");
        let dumped = instance.dump().expect("dump must succeed");
        let reloaded = schema.load(&dumped).expect("dumped record must load");
        prop_assert_eq!(&reloaded, &instance);
        prop_assert_eq!(Value::Object(dumped), Value::Object(data));
    }

    #[test]
    fn test_unknown_keys_are_always_reported(data in record(), key in "x_[a-z]{1,6}") {
        let schema = person();
        let mut data = data;
        data.insert(key.clone(), json!(1));
        let error = schema.load(&data).expect_err("extra key must be rejected");
        prop_assert_eq!(error.keys(), vec![key.as_str()]);
    }
}
