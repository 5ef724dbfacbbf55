// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-mode model calls with a single repair attempt.

use std::time::Duration;

use mockview_core::traits::ProviderAdapter;
use mockview_core::types::ChatRequest;
use mockview_core::MockviewError;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::gate::CallGate;
use crate::prompts::repair_messages;

/// Returns the JSON object embedded in model output.
///
/// Handles fenced code blocks (```` ```json ````) and stray prose around the
/// object by taking the outermost braces.
pub fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```JSON"))
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```").trim())
        .unwrap_or(trimmed);

    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}

/// Parses model output as `T`, tolerating fences and surrounding prose.
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> Result<T, MockviewError> {
    serde_json::from_str(extract_json(raw)).map_err(|e| MockviewError::Schema {
        message: e.to_string(),
    })
}

/// Rounds a model-reported score and checks it lies in 1..=10.
pub fn bounded_score(field: &str, value: f64) -> Result<u8, MockviewError> {
    let rounded = value.round();
    if !(1.0..=10.0).contains(&rounded) {
        return Err(MockviewError::Schema {
            message: format!("{field} must be between 1 and 10, got {value}"),
        });
    }
    Ok(rounded as u8)
}

/// Issues a JSON-mode call and parses it with `parse`.
///
/// If the first output fails to parse, one repair call asks the model to fix
/// it against `schema`. Upstream errors and timeouts are returned as-is.
pub async fn complete_structured<T, P>(
    provider: &dyn ProviderAdapter,
    gate: &CallGate,
    deadline: Duration,
    request: ChatRequest,
    schema: &str,
    parse: P,
) -> Result<T, MockviewError>
where
    P: Fn(&str) -> Result<T, MockviewError>,
{
    let temperature = request.temperature;
    let max_tokens = request.max_tokens;

    let response = gate
        .run_with_timeout(deadline, provider.complete(request))
        .await?;

    let problem = match parse(&response.content) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    warn!(error = %problem, "model output failed validation, attempting repair");

    let repair = ChatRequest {
        model: None,
        messages: repair_messages(schema, &response.content, &problem.to_string()),
        temperature,
        max_tokens,
        json_output: true,
    };
    let repaired = gate
        .run_with_timeout(deadline, provider.complete(repair))
        .await?;

    let value = parse(&repaired.content)?;
    debug!("repaired model output parsed");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockview_core::types::ChatMessage;
    use mockview_test_utils::MockChatModel;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Score {
        score: u8,
    }

    fn parse_score(raw: &str) -> Result<Score, MockviewError> {
        let score: Score = parse_model_json(raw)?;
        if !(1..=10).contains(&score.score) {
            return Err(MockviewError::Schema {
                message: format!("score {} out of range", score.score),
            });
        }
        Ok(score)
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: None,
            messages: vec![ChatMessage::user("score it")],
            temperature: 0.3,
            max_tokens: 100,
            json_output: true,
        }
    }

    #[test]
    fn extracts_from_fenced_block() {
        let raw = "```json\n{\"score\": 4}\n```";
        assert_eq!(extract_json(raw), "{\"score\": 4}");
    }

    #[test]
    fn extracts_from_surrounding_prose() {
        let raw = "Here is the analysis: {\"score\": 4} Hope this helps.";
        assert_eq!(extract_json(raw), "{\"score\": 4}");
    }

    #[test]
    fn plain_json_is_unchanged() {
        assert_eq!(extract_json(" {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn invalid_json_is_schema_error() {
        let err = parse_model_json::<Score>("not json").unwrap_err();
        assert!(matches!(err, MockviewError::Schema { .. }));
    }

    #[tokio::test]
    async fn valid_first_output_needs_one_call() {
        let model = MockChatModel::with_responses(vec!["{\"score\": 7}".into()]);
        let gate = CallGate::new(1, Duration::from_secs(1));
        let score = complete_structured(&model, &gate, Duration::from_secs(1), request(), "{}", parse_score)
            .await
            .unwrap();
        assert_eq!(score, Score { score: 7 });
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn repair_call_fixes_bad_output() {
        let model = MockChatModel::with_responses(vec![
            "{\"score\": 42}".into(),
            "{\"score\": 9}".into(),
        ]);
        let gate = CallGate::new(1, Duration::from_secs(1));
        let score = complete_structured(&model, &gate, Duration::from_secs(1), request(), "{}", parse_score)
            .await
            .unwrap();
        assert_eq!(score.score, 9);
        assert_eq!(model.call_count(), 2);

        let repair = model.requests().pop().unwrap();
        assert!(repair.json_output);
        assert!(repair.messages[1].content.contains("score 42 out of range"));
    }

    #[tokio::test]
    async fn second_failure_is_returned() {
        let model = MockChatModel::with_responses(vec!["nope".into(), "still nope".into()]);
        let gate = CallGate::new(1, Duration::from_secs(1));
        let err = complete_structured(&model, &gate, Duration::from_secs(1), request(), "{}", parse_score)
            .await
            .unwrap_err();
        assert!(matches!(err, MockviewError::Schema { .. }));
        assert_eq!(model.call_count(), 2);
    }
}
