use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::user::insert_some;
use super::{coerce_int, coerce_number, validate_email, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    #[default]
    Pending,
    Approved,
    Denied,
}

impl ClassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassStatus::Pending => "pending",
            ClassStatus::Approved => "approved",
            ClassStatus::Denied => "denied",
        }
    }
}

/// Class fields an instructor sends on create and edit
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPayload {
    pub name: Option<String>,
    pub image: Option<String>,
    pub available_seats: Option<Value>,
    pub price: Option<Value>,
    pub video_link: Option<String>,
    pub description: Option<String>,
    pub instructor_name: Option<String>,
    pub instructor_email: Option<String>,
}

impl ClassPayload {
    /// Document for `POST /new-class`: pending, nobody enrolled yet.
    /// The instructor defaults to the caller.
    pub fn into_new_document(self, caller_email: &str, submitted: &str) -> Result<Value, ModelError> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or(ModelError::MissingField("name"))?;
        let instructor_email = self.instructor_email.unwrap_or_else(|| caller_email.to_string());
        validate_email("instructorEmail", &instructor_email)?;

        let seats = match &self.available_seats {
            Some(v) => coerce_int("availableSeats", v)?,
            None => 0,
        };
        if seats < 0 {
            return Err(ModelError::InvalidField { field: "availableSeats", reason: "must not be negative".into() });
        }

        let mut doc = Map::new();
        doc.insert("name".into(), Value::String(name));
        insert_some(&mut doc, "image", self.image.map(Value::String));
        doc.insert("availableSeats".into(), Value::from(seats));
        insert_some(&mut doc, "price", self.price.as_ref().map(|p| coerce_number("price", p)).transpose()?);
        insert_some(&mut doc, "videoLink", self.video_link.map(Value::String));
        insert_some(&mut doc, "description", self.description.map(Value::String));
        insert_some(&mut doc, "instructorName", self.instructor_name.map(Value::String));
        doc.insert("instructorEmail".into(), Value::String(instructor_email));
        doc.insert("status".into(), Value::String(ClassStatus::Pending.as_str().into()));
        doc.insert("submitted".into(), Value::String(submitted.to_string()));
        doc.insert("totalEnrolled".into(), Value::from(0));
        Ok(Value::Object(doc))
    }

    /// `$set` for `PUT /update-class/:id`. Any edit sends the class back to review.
    pub fn into_update_set(self) -> Result<Map<String, Value>, ModelError> {
        let mut set = Map::new();
        insert_some(&mut set, "name", self.name.map(Value::String));
        insert_some(&mut set, "description", self.description.map(Value::String));
        insert_some(&mut set, "price", self.price.as_ref().map(|p| coerce_number("price", p)).transpose()?);
        insert_some(
            &mut set,
            "availableSeats",
            self.available_seats
                .as_ref()
                .map(|v| coerce_int("availableSeats", v).map(Value::from))
                .transpose()?,
        );
        insert_some(&mut set, "videoLink", self.video_link.map(Value::String));
        insert_some(&mut set, "image", self.image.map(Value::String));
        set.insert("status".into(), Value::String(ClassStatus::Pending.as_str().into()));
        Ok(set)
    }
}

/// `PATCH /change-status/:id` body
#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: ClassStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

impl StatusChange {
    pub fn into_set(self) -> Map<String, Value> {
        let mut set = Map::new();
        set.insert("status".into(), Value::String(self.status.as_str().into()));
        set.insert("reason".into(), self.reason.map(Value::String).unwrap_or(Value::Null));
        set
    }
}
