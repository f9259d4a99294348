use std::borrow::Cow;
use std::collections::HashMap;
use validator::ValidationError;

pub fn add_error(code: &'static str, messages: String, field_value: &str) -> ValidationError {
    ValidationError {
        code: code.into(),
        message: Some(Cow::Owned(messages)),
        params: {
            let mut params = HashMap::new();
            params.insert("value".into(), serde_json::json!(field_value));
            params
        },
    }
}
