use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The task state handed to `main(task)` and read back from it.
///
/// Field names are camelCase on the JS side. Outputs are pre-seeded from the
/// inputs before the script runs; a field the script leaves untouched (or a
/// returned object that omits it) therefore keeps the propagated value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptTask {
    /// Original request body; scripts read it, never rewrite it.
    pub body: Option<String>,
    pub input_request_body: Option<String>,
    pub input_response_body: Option<String>,
    pub output_request_body: Option<String>,
    pub output_response_body: Option<String>,
    pub request_headers: HashMap<String, String>,
    pub request_params: HashMap<String, String>,
    pub response_headers: HashMap<String, String>,
}

impl ScriptTask {
    /// Merge the object returned by the script over this state. Scalar
    /// fields use the returned value when present; header maps are replaced
    /// wholesale since the script saw the full map.
    pub fn merged_with(mut self, returned: ScriptTask) -> ScriptTask {
        if returned.output_request_body.is_some() {
            self.output_request_body = returned.output_request_body;
        }
        if returned.output_response_body.is_some() {
            self.output_response_body = returned.output_response_body;
        }
        self.request_headers = returned.request_headers;
        self.response_headers = returned.response_headers;
        self
    }
}
