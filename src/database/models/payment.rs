use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::user::insert_some;
use super::{validate_email, ModelError};

/// `POST /payment-info` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub transaction_id: Option<String>,
    pub price: Option<Value>,
    pub quantity: Option<Value>,
    #[serde(default)]
    pub classes_id: Vec<String>,
    pub payment_status: Option<String>,
    pub date: Option<String>,
}

/// Enrollment written alongside a payment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledRecord {
    pub user_email: String,
    pub user_name: Option<String>,
    pub classes_id: Vec<String>,
    pub transaction_id: Option<String>,
}

/// A payment ready to be recorded
#[derive(Debug, Clone)]
pub struct PreparedPayment {
    pub user_email: String,
    pub class_ids: Vec<String>,
    pub payment: Value,
    pub enrolled: EnrolledRecord,
}

impl PaymentInfo {
    /// Purchased classes come from `classesId`; a single `classId` from the
    /// query string covers one-click purchases that send none.
    pub fn prepare(self, caller_email: &str, class_id: Option<String>, now: &str) -> Result<PreparedPayment, ModelError> {
        let user_email = self.user_email.unwrap_or_else(|| caller_email.to_string());
        validate_email("userEmail", &user_email)?;

        let class_ids = if self.classes_id.is_empty() {
            class_id.filter(|id| !id.trim().is_empty()).into_iter().collect()
        } else {
            self.classes_id
        };
        if class_ids.is_empty() {
            return Err(ModelError::MissingField("classesId"));
        }

        let mut payment = Map::new();
        payment.insert("userEmail".into(), Value::String(user_email.clone()));
        insert_some(&mut payment, "userName", self.user_name.clone().map(Value::String));
        insert_some(&mut payment, "transactionId", self.transaction_id.clone().map(Value::String));
        insert_some(&mut payment, "price", self.price);
        insert_some(&mut payment, "quantity", self.quantity);
        payment.insert("classesId".into(), Value::from(class_ids.clone()));
        insert_some(&mut payment, "paymentStatus", self.payment_status.map(Value::String));
        payment.insert("date".into(), Value::String(self.date.unwrap_or_else(|| now.to_string())));

        let enrolled = EnrolledRecord {
            user_email: user_email.clone(),
            user_name: self.user_name,
            classes_id: class_ids.clone(),
            transaction_id: self.transaction_id,
        };

        Ok(PreparedPayment { user_email, class_ids, payment: Value::Object(payment), enrolled })
    }
}
