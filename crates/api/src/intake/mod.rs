//! Forms-intake platform REST client.
//!
//! Transforms an arbitrary mapping of answer keys into the shape the intake
//! platform expects and submits it as a single POST. Key order in the
//! outgoing payload is contractual: special fields lead, question keys
//! follow in ascending question-number order (`serde_json` runs with
//! `preserve_order` for this reason).

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::instrument;

use crate::config::IntakeConfig;

/// Fields passed through unchanged and placed first in the payload.
const SPECIAL_FIELDS: &[&str] = &[
    "patient_id",
    "shipping_address_line_1",
    "shipping_city",
    "shipping_state",
    "shipping_zip",
];

/// Question number assigned to answer keys with no mapping entry.
///
/// A real question-number lookup belongs to the intake platform's form
/// definition; deployments can supply one through the configuration map,
/// and anything unmapped keeps this placeholder.
const PLACEHOLDER_QUESTION: u32 = 99;

/// Visit modality reported with every submission.
const MODALITY: &str = "async_visit";

/// Errors that can occur when talking to the intake platform.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// No HTTP response at all.
    #[error("intake service is unavailable")]
    Unavailable,

    /// The endpoint answered with a non-success status.
    #[error("intake API returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body was not valid JSON.
    #[error("intake response parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Client for the forms-intake platform.
#[derive(Clone)]
pub struct IntakeClient {
    inner: Arc<IntakeClientInner>,
}

struct IntakeClientInner {
    client: reqwest::Client,
    form_url: String,
    form_id: String,
    question_numbers: HashMap<String, u32>,
}

impl IntakeClient {
    /// Create a new intake client.
    #[must_use]
    pub fn new(config: &IntakeConfig) -> Self {
        Self {
            inner: Arc::new(IntakeClientInner {
                client: reqwest::Client::new(),
                form_url: config.form_url.clone(),
                form_id: config.form_id.clone(),
                question_numbers: config.question_numbers.clone(),
            }),
        }
    }

    /// Submit intake form answers.
    ///
    /// Reformats the answer keys, assembles the payload and POSTs it once;
    /// any transport failure or non-2xx response surfaces as an error with
    /// no retry.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::Unavailable`] when no response arrives,
    /// [`IntakeError::Api`] for non-success statuses.
    #[instrument(skip(self, answers))]
    pub async fn upload_form_answers(
        &self,
        answers: &Map<String, Value>,
    ) -> Result<Value, IntakeError> {
        let reformatted = reformat_answers(answers, &self.inner.question_numbers);

        let mut data = Map::new();
        if let Some(patient_id) = answers.get("patient_id") {
            data.insert("patient_id".to_owned(), patient_id.clone());
        }
        data.insert("formReferenceId".to_owned(), json!(self.inner.form_id));
        data.insert("mwl_modality".to_owned(), json!(MODALITY));
        for (key, value) in reformatted {
            data.insert(key, value);
        }

        let payload = json!({ "data": data });

        let response = self
            .inner
            .client
            .post(&self.inner.form_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "intake request failed without a response");
                IntakeError::Unavailable
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %message.chars().take(500).collect::<String>(),
                "intake API returned non-success status"
            );
            return Err(IntakeError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let body = response.text().await.map_err(|e| {
            tracing::warn!(error = %e, "intake response body could not be read");
            IntakeError::Unavailable
        })?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Reformat raw answer keys into the intake platform's shape.
///
/// - Special fields pass through unchanged and come first, in their
///   allow-list order.
/// - Keys already carrying a `q<number>_` prefix pass through unchanged.
/// - Every other key gets a `q<number>_` prefix from the mapping table, or
///   the `q99_` placeholder when unmapped.
/// - Non-special keys are ordered ascending by their question number
///   (stable for ties).
#[must_use]
pub fn reformat_answers(
    answers: &Map<String, Value>,
    question_numbers: &HashMap<String, u32>,
) -> Map<String, Value> {
    let mut question_keys: Vec<(u32, String)> = Vec::new();
    let mut reformatted: Map<String, Value> = Map::new();

    for (key, value) in answers {
        if SPECIAL_FIELDS.contains(&key.as_str()) {
            reformatted.insert(key.clone(), value.clone());
        } else if let Some(number) = question_number(key) {
            reformatted.insert(key.clone(), value.clone());
            question_keys.push((number, key.clone()));
        } else {
            let number = question_numbers
                .get(key)
                .copied()
                .unwrap_or(PLACEHOLDER_QUESTION);
            let new_key = format!("q{number}_{key}");
            reformatted.insert(new_key.clone(), value.clone());
            question_keys.push((number, new_key));
        }
    }

    question_keys.sort_by_key(|(number, _)| *number);

    let mut ordered = Map::new();
    for field in SPECIAL_FIELDS {
        if let Some(value) = reformatted.get(*field) {
            ordered.insert((*field).to_owned(), value.clone());
        }
    }
    for (_, key) in question_keys {
        if let Some(value) = reformatted.get(&key) {
            ordered.insert(key, value.clone());
        }
    }

    ordered
}

/// Parse the number out of a `q<number>_` prefixed key.
fn question_number(key: &str) -> Option<u32> {
    let rest = key.strip_prefix('q')?;
    let underscore = rest.find('_')?;
    let digits = &rest[..underscore];
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(&str, &str)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), json!(v)))
            .collect()
    }

    #[test]
    fn test_question_number_parsing() {
        assert_eq!(question_number("q12_weight"), Some(12));
        assert_eq!(question_number("q1_a"), Some(1));
        assert_eq!(question_number("weight"), None);
        assert_eq!(question_number("q_weight"), None);
        assert_eq!(question_number("qx_weight"), None);
        assert_eq!(question_number("12_weight"), None);
    }

    #[test]
    fn test_unmapped_key_gets_placeholder_prefix() {
        let out = reformat_answers(
            &answers(&[("weight", "150"), ("patient_id", "abc")]),
            &HashMap::new(),
        );
        let keys: Vec<&String> = out.keys().collect();
        assert_eq!(keys, vec!["patient_id", "q99_weight"]);
        assert_eq!(out["q99_weight"], json!("150"));
    }

    #[test]
    fn test_special_fields_come_first() {
        let out = reformat_answers(
            &answers(&[
                ("q2_height", "70"),
                ("shipping_city", "Austin"),
                ("q1_name", "Jane"),
                ("patient_id", "abc"),
            ]),
            &HashMap::new(),
        );
        let keys: Vec<&String> = out.keys().collect();
        assert_eq!(
            keys,
            vec!["patient_id", "shipping_city", "q1_name", "q2_height"]
        );
    }

    #[test]
    fn test_question_keys_sorted_numerically() {
        let out = reformat_answers(
            &answers(&[("q10_b", "x"), ("q2_a", "y"), ("q33_c", "z")]),
            &HashMap::new(),
        );
        let keys: Vec<&String> = out.keys().collect();
        assert_eq!(keys, vec!["q2_a", "q10_b", "q33_c"]);
    }

    #[test]
    fn test_mapping_table_overrides_placeholder() {
        let mapping = HashMap::from([("weight".to_owned(), 7u32)]);
        let out = reformat_answers(
            &answers(&[("weight", "150"), ("q12_height", "70")]),
            &mapping,
        );
        let keys: Vec<&String> = out.keys().collect();
        assert_eq!(keys, vec!["q7_weight", "q12_height"]);
    }

    #[test]
    fn test_placeholder_ties_keep_insertion_order() {
        let out = reformat_answers(
            &answers(&[("weight", "150"), ("allergies", "none")]),
            &HashMap::new(),
        );
        let keys: Vec<&String> = out.keys().collect();
        assert_eq!(keys, vec!["q99_weight", "q99_allergies"]);
    }
}
