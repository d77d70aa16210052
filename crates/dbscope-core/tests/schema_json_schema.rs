use dbscope_core::Schema;
use schemars::schema_for;

#[test]
fn json_schema_exposes_model_fields() {
    let generated = schema_for!(Schema);
    let json = serde_json::to_value(&generated).expect("serialize generated schema");

    let properties = json["properties"]
        .as_object()
        .expect("root object has properties");
    for field in ["name", "driver", "tables", "relations"] {
        assert!(properties.contains_key(field), "missing {field}");
    }

    let definitions = json["definitions"]
        .as_object()
        .expect("schema has definitions");
    for model in ["Table", "Column", "Constraint", "Index", "Trigger", "TableKind"] {
        assert!(definitions.contains_key(model), "missing definition {model}");
    }
    assert_eq!(definitions["TableKind"]["type"], "string");
}
