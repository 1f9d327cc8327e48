use serde::Deserialize;
use serde_json::{json, Value};

use super::{validate_email, ModelError};

/// `POST /add-to-cart` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub class_id: Option<String>,
    pub user_mail: Option<String>,
    pub date: Option<Value>,
}

impl CartItem {
    pub fn into_document(self, caller_email: &str, now: &str) -> Result<Value, ModelError> {
        let class_id = self
            .class_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(ModelError::MissingField("classId"))?;
        let user_mail = self.user_mail.unwrap_or_else(|| caller_email.to_string());
        validate_email("userMail", &user_mail)?;

        Ok(json!({
            "classId": class_id,
            "userMail": user_mail,
            "date": self.date.unwrap_or_else(|| Value::String(now.to_string())),
        }))
    }
}
