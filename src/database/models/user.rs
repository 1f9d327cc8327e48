use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{normalize_email, validate_email, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Instructor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }

    /// Role stored on a user document; documents without one are plain users
    pub fn of(user: &Value) -> Option<Role> {
        match user.get("role") {
            None | Some(Value::Null) => Some(Role::User),
            Some(role) => serde_json::from_value(role.clone()).ok(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `POST /new-user` body. Any client-sent role is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<Value>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub skills: Option<Value>,
}

impl NewUser {
    pub fn into_document(self, role: Role) -> Result<Value, ModelError> {
        validate_email("email", &self.email)?;

        let mut doc = Map::new();
        doc.insert("name".into(), self.name.map(Value::String).unwrap_or(Value::Null));
        doc.insert("email".into(), Value::String(normalize_email(&self.email)));
        doc.insert("role".into(), Value::String(role.as_str().to_string()));
        insert_some(&mut doc, "photoUrl", self.photo_url.map(Value::String));
        insert_some(&mut doc, "gender", self.gender.map(Value::String));
        insert_some(&mut doc, "address", self.address.map(Value::String));
        insert_some(&mut doc, "phone", self.phone);
        insert_some(&mut doc, "about", self.about.map(Value::String));
        insert_some(&mut doc, "skills", self.skills);
        Ok(Value::Object(doc))
    }
}

/// `PUT /update-user/:id` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub address: Option<String>,
    pub phone: Option<Value>,
    pub about: Option<String>,
    pub photo_url: Option<String>,
    pub skills: Option<Value>,
}

impl UserUpdate {
    /// Fields for `$set`. `skills` is always written, null when absent.
    pub fn into_set(self) -> Result<Map<String, Value>, ModelError> {
        if let Some(email) = &self.email {
            validate_email("email", email)?;
        }

        let mut set = Map::new();
        insert_some(&mut set, "name", self.name.map(Value::String));
        insert_some(&mut set, "email", self.email.map(|e| Value::String(normalize_email(&e))));
        insert_some(&mut set, "role", self.role.map(|r| Value::String(r.as_str().to_string())));
        insert_some(&mut set, "address", self.address.map(Value::String));
        insert_some(&mut set, "phone", self.phone);
        insert_some(&mut set, "about", self.about.map(Value::String));
        insert_some(&mut set, "photoUrl", self.photo_url.map(Value::String));
        set.insert("skills".into(), self.skills.unwrap_or(Value::Null));
        Ok(set)
    }
}

pub(crate) fn insert_some(doc: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        doc.insert(key.to_string(), value);
    }
}
