use serde::de::DeserializeOwned;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(describe)
}

/// Same, for a document that was already parsed (and validated) as a [`serde_json::Value`].
pub fn from_value_with_path<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, String> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(describe)
}

fn describe<E: std::fmt::Display>(err: serde_path_to_error::Error<E>) -> String {
    let path = err.path().to_string();
    format!("at JSON path {path}: {}", err.into_inner())
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Output {
        #[serde(rename = "schemaPath")]
        schema_path: String,
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Doc {
        output: Output,
    }

    #[test]
    fn errors_name_the_failing_path() {
        let err = from_str_with_path::<Doc>(r#"{ "output": { "schemaPath": 3 } }"#).unwrap_err();
        assert!(err.starts_with("at JSON path output.schemaPath:"), "{err}");
        let err = from_value_with_path::<Doc>(serde_json::json!({ "output": {} })).unwrap_err();
        assert!(err.contains("schemaPath"), "{err}");
    }
}
