use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Columns recognized by the user table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Name,
    Age,
    Address,
}

impl Field {
    /// Fields a draft may change, in column order
    pub const EDITABLE: [Field; 3] = [Field::Name, Field::Age, Field::Address];

    pub fn is_editable(&self) -> bool {
        !matches!(self, Field::Id)
    }

    /// Column title used in prompts and error messages.
    pub fn title(&self) -> &'static str {
        match self {
            Field::Id => "Id",
            Field::Name => "Name",
            Field::Age => "Age",
            Field::Address => "Address",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Id => write!(f, "id"),
            Field::Name => write!(f, "name"),
            Field::Age => write!(f, "age"),
            Field::Address => write!(f, "address"),
        }
    }
}

impl FromStr for Field {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "id" => Ok(Field::Id),
            "name" => Ok(Field::Name),
            "age" => Ok(Field::Age),
            "address" => Ok(Field::Address),
            other => Err(ValidationError::UnknownField(other.to_string())),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field is not editable: {0}")]
    NotEditable(Field),

    #[error("Please input {}", .0.title())]
    Required(Field),

    #[error("Age must be a whole number, got {0:?}")]
    InvalidAge(String),
}

/// The editable part of a user, as held in the local cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFields {
    pub name: String,
    pub age: u32,
    pub address: String,
}

impl UserFields {
    /// Merge a patch into these fields. Absent entries are left alone.
    pub fn merge(&mut self, patch: FieldPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
    }
}

/// Partial update of a user's editable fields.
///
/// This is also the request body of the store's update call, so absent
/// entries are left out of the serialized JSON entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPatch {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub address: Option<String>,
}

impl From<UserFields> for FieldPatch {
    fn from(fields: UserFields) -> Self {
        Self {
            name: Some(fields.name),
            age: Some(fields.age),
            address: Some(fields.address),
        }
    }
}

/// A user as returned by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: i64,
    pub name: String,
    pub age: u32,
    pub address: String,
}

impl RemoteUser {
    pub fn fields(&self) -> UserFields {
        UserFields {
            name: self.name.clone(),
            age: self.age,
            address: self.address.clone(),
        }
    }
}

// API response wrappers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<RemoteUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: RemoteUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: bool,
}

/// Textual working copy of a record while it is being edited.
///
/// Values are kept as typed text; nothing is parsed until `validate`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub name: String,
    pub age: String,
    pub address: String,
}

impl Draft {
    pub fn from_fields(fields: &UserFields) -> Self {
        Self {
            name: fields.name.clone(),
            age: fields.age.to_string(),
            address: fields.address.clone(),
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Id => None,
            Field::Name => Some(&self.name),
            Field::Age => Some(&self.age),
            Field::Address => Some(&self.address),
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) -> Result<(), ValidationError> {
        let slot = match field {
            Field::Id => return Err(ValidationError::NotEditable(field)),
            Field::Name => &mut self.name,
            Field::Age => &mut self.age,
            Field::Address => &mut self.address,
        };
        *slot = value.into();
        Ok(())
    }

    /// Check every editable field and produce the typed values.
    ///
    /// Reports the first failing field in column order. Text fields are sent
    /// exactly as typed; only the age is trimmed before parsing.
    pub fn validate(&self) -> Result<UserFields, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Required(Field::Name));
        }

        let age_text = self.age.trim();
        if age_text.is_empty() {
            return Err(ValidationError::Required(Field::Age));
        }
        let age = age_text
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidAge(self.age.clone()))?;

        if self.address.trim().is_empty() {
            return Err(ValidationError::Required(Field::Address));
        }

        Ok(UserFields {
            name: self.name.clone(),
            age,
            address: self.address.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> UserFields {
        UserFields {
            name: "A".to_string(),
            age: 20,
            address: "X".to_string(),
        }
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("name".parse::<Field>(), Ok(Field::Name));
        assert_eq!(" Age ".parse::<Field>(), Ok(Field::Age));
        assert_eq!("ADDRESS".parse::<Field>(), Ok(Field::Address));
        assert_eq!("id".parse::<Field>(), Ok(Field::Id));
        assert_eq!(
            "email".parse::<Field>(),
            Err(ValidationError::UnknownField("email".to_string()))
        );
    }

    #[test]
    fn test_id_is_not_editable() {
        assert!(!Field::Id.is_editable());
        assert!(Field::EDITABLE.iter().all(|f| f.is_editable()));

        let mut draft = Draft::from_fields(&fields());
        assert_eq!(
            draft.set(Field::Id, "7"),
            Err(ValidationError::NotEditable(Field::Id))
        );
        assert_eq!(draft.get(Field::Id), None);
    }

    #[test]
    fn test_draft_from_fields() {
        let draft = Draft::from_fields(&fields());
        assert_eq!(draft.get(Field::Name), Some("A"));
        assert_eq!(draft.get(Field::Age), Some("20"));
        assert_eq!(draft.get(Field::Address), Some("X"));
    }

    #[test]
    fn test_validate_keeps_text_as_typed() {
        let draft = Draft {
            name: "  Ann ".to_string(),
            age: " 21".to_string(),
            address: "Main St ".to_string(),
        };
        let valid = draft.validate().unwrap();
        assert_eq!(valid.name, "  Ann ");
        assert_eq!(valid.age, 21);
        assert_eq!(valid.address, "Main St ");

        let blank = Draft {
            name: "   ".to_string(),
            ..draft
        };
        assert_eq!(blank.validate(), Err(ValidationError::Required(Field::Name)));
    }

    #[test]
    fn test_validate_rejects_non_numeric_age() {
        let mut draft = Draft::from_fields(&fields());
        draft.set(Field::Age, "twenty").unwrap();
        assert_eq!(
            draft.validate(),
            Err(ValidationError::InvalidAge("twenty".to_string()))
        );

        draft.set(Field::Age, "-3").unwrap();
        assert!(matches!(draft.validate(), Err(ValidationError::InvalidAge(_))));
    }

    #[test]
    fn test_validate_requires_every_editable_field() {
        let mut draft = Draft::default();
        assert_eq!(draft.validate(), Err(ValidationError::Required(Field::Name)));

        draft.set(Field::Name, "A").unwrap();
        assert_eq!(draft.validate(), Err(ValidationError::Required(Field::Age)));

        draft.set(Field::Age, "1").unwrap();
        assert_eq!(
            draft.validate(),
            Err(ValidationError::Required(Field::Address))
        );
    }

    #[test]
    fn test_merge_patch() {
        let mut f = fields();
        f.merge(FieldPatch {
            age: Some(21),
            ..Default::default()
        });
        assert_eq!(f.name, "A");
        assert_eq!(f.age, 21);
        assert_eq!(f.address, "X");
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let patch = FieldPatch {
            name: Some("B".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"name":"B"}"#);

        let full: FieldPatch = fields().into();
        let json = serde_json::to_value(&full).unwrap();
        assert_eq!(json["age"], 20);
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_parse_store_responses() {
        let json = r#"{"users":[{"id":1,"name":"A","age":20,"address":"X"}]}"#;
        let resp: UsersResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.users.len(), 1);
        assert_eq!(resp.users[0].fields(), fields());

        let resp: UserResponse =
            serde_json::from_str(r#"{"user":{"id":1,"name":"A","age":21,"address":"X"}}"#).unwrap();
        assert_eq!(resp.user.age, 21);

        let resp: DeleteResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!resp.success);
        let resp: DeleteResponse = serde_json::from_str("{}").unwrap();
        assert!(!resp.success);
    }
}
