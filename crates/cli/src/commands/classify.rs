use mercabot_agent::GuardrailClassifier;

use super::CommandResult;

/// One-shot classification through the guardrail tier only. Useful for
/// checking what the fast path would do with an utterance before it ever
/// reaches the router or the reasoner.
pub fn run(text: &str) -> CommandResult {
    let result = GuardrailClassifier::new().classify(text);
    match serde_json::to_string_pretty(&result) {
        Ok(json) => CommandResult::success(json),
        Err(error) => CommandResult::failure(format!("serialization failed: {error}"), 1),
    }
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn output_is_valid_json_with_the_expected_keys() {
        let result = run("busco mochilas rojas");
        assert_eq!(result.exit_code, 0);

        let value: serde_json::Value = serde_json::from_str(&result.output).expect("json");
        assert_eq!(value["intent"], "PRODUCT_SEARCH");
        assert!(value["confidence"].as_f64().is_some());
        assert_eq!(value["entities"]["search_term"], "mochilas");
    }
}
