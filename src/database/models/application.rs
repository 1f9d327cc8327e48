use serde::Deserialize;
use serde_json::{Map, Value};

use super::{validate_email, ModelError};

/// `POST /as-instructor` body. Free-form beyond the applicant's email.
#[derive(Debug, Clone, Deserialize)]
pub struct InstructorApplication {
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl InstructorApplication {
    pub fn into_document(self, submitted: &str) -> Result<Value, ModelError> {
        validate_email("email", &self.email)?;

        let mut doc = self.details;
        doc.insert("email".into(), Value::String(self.email.trim().to_string()));
        doc.entry("submitted").or_insert_with(|| Value::String(submitted.to_string()));
        Ok(Value::Object(doc))
    }
}
