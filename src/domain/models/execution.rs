use serde_derive::Deserialize;
use serde_derive::Serialize;

/// Response of the sandbox execution endpoint for a code fragment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExecutionResult {
    pub sbx_id: String,
    pub template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_error: Option<String>,
}
