use schemars::JsonSchema;
use serde::Deserialize;

/// Log output format style, one of the formats of `tracing_subscriber::fmt`
#[derive(Debug, Default, Deserialize, JsonSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormatStyle {
    /// Human-readable, single-line logs
    #[default]
    Full,
    /// Shorter single-line logs
    Compact,
    /// Newline-delimited JSON objects
    Json,
    /// Multi-line logs including source locations
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::FormatStyle;
    use rstest::rstest;

    #[rstest]
    #[case("full", FormatStyle::Full)]
    #[case("compact", FormatStyle::Compact)]
    #[case("json", FormatStyle::Json)]
    #[case("pretty", FormatStyle::Pretty)]
    fn deserializes_lowercase_names(#[case] yaml_value: &str, #[case] expected: FormatStyle) {
        let actual: FormatStyle = serde_yaml::from_str(yaml_value).unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case("JSON")]
    #[case("Full")]
    #[case("logfmt")]
    fn rejects_other_names(#[case] invalid_value: &str) {
        let result: Result<FormatStyle, _> = serde_yaml::from_str(invalid_value);
        assert!(result.is_err_and(|e| e.to_string().contains("unknown variant")));
    }
}
