use serde::{Deserialize, Deserializer, Serialize};

/// Request body sent to the suggestion service
#[derive(Debug, Clone, Serialize)]
pub struct ReviewRequest<'a> {
    pub text: &'a str,
}

/// A sentence the service wants rewritten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub original_sentence: String,
    pub revised_sentence: String,
    pub clear_explanation: String,
}

/// Response body of the suggestion service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub violations: Vec<Violation>,
    /// Link to the trace of the run that produced the suggestions
    #[serde(default)]
    pub run_url: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Violation>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Violation>>::deserialize(deserializer)?.unwrap_or_default())
}
