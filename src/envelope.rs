//! Backend response envelopes, decoded at the boundary.
//!
//! Both backend endpoints wrap their payload in a JSON object carrying a
//! `status` string. Anything other than `"success"` is a failure, with the
//! reason taken from the optional `error` field.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::constants::SUCCESS_STATUS;
use crate::error::PipelineError;

/// A decoded backend reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Envelope<T> {
    /// The backend did the work, here is the payload
    Success(T),
    /// The backend answered but reported failure, with its reason
    Failure(String),
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decodes a raw response body.
    ///
    /// A success envelope must carry a complete payload; missing or
    /// mistyped fields are rejected rather than defaulted.
    pub fn decode(body: &[u8]) -> Result<Self, PipelineError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|err| PipelineError::Malformed(format!("invalid JSON: {err}")))?;
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| PipelineError::Malformed("missing string `status` field".to_string()))?
            .to_owned();

        if status != SUCCESS_STATUS {
            let reason = value
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("backend reported status {status:?}"));
            return Ok(Envelope::Failure(reason));
        }

        serde_json::from_value(value)
            .map(Envelope::Success)
            .map_err(|err| PipelineError::Malformed(err.to_string()))
    }

    /// Collapses a failure envelope into [`PipelineError::ApplicationFailure`].
    pub fn into_result(self) -> Result<T, PipelineError> {
        match self {
            Envelope::Success(payload) => Ok(payload),
            Envelope::Failure(reason) => Err(PipelineError::ApplicationFailure(reason)),
        }
    }
}

/// Body posted to the processing endpoint.
#[derive(Debug, Serialize)]
pub struct ProcessRequest<'a> {
    /// The submitted handle
    pub message: &'a str,
}

/// Body posted to the image endpoint.
#[derive(Debug, Serialize)]
pub struct ImageRequest<'a> {
    /// The prompt produced by the processing endpoint
    pub prompt: &'a str,
}

/// Payload of a successful processing reply.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProcessingResult {
    /// Text prompt for the image generator
    #[serde(rename = "response")]
    pub prompt_text: String,
    /// Link to the GitHub profile
    #[serde(rename = "github_url")]
    pub profile_url: String,
    /// Number of public repositories
    #[serde(rename = "num_repositories")]
    pub repository_count: u64,
    /// Languages used across the profile, in backend order
    #[serde(rename = "languages", default, deserialize_with = "null_as_empty")]
    pub language_tags: Vec<String>,
}

/// Payload of a successful image reply.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageResult {
    /// Where the generated image can be fetched, possibly relative to the backend
    pub image_url: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
