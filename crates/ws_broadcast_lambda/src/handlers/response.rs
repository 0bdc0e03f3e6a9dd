use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(skip_serializing_if = "Value::is_null", default)]
    pub headers: Value,
    pub body: String,
}

impl ApiGatewayResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// JSON success body; the headers are left to the gateway defaults.
pub fn success_response(payload: impl Serialize) -> ApiGatewayResponse {
    match serde_json::to_string(&payload) {
        Ok(body) => ApiGatewayResponse {
            status_code: 200,
            headers: Value::Null,
            body,
        },
        Err(error) => error_response(500, &format!("failed to serialize response: {error}")),
    }
}

pub fn error_response(status_code: u16, message: &str) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({"content-type": "text/plain; charset=utf-8"}),
        body: message.to_string(),
    }
}
