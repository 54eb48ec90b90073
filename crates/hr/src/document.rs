use serde_json::{Map, Value};

/// Free-form document fields.
pub type Fields = Map<String, Value>;

/// Key every stored document uses for its identifier.
pub const ID_KEY: &str = "_id";

/// Drop keys the server owns so clients cannot smuggle them in.
pub(crate) fn strip_keys(mut fields: Fields, keys: &[&str]) -> Fields {
    for key in keys {
        fields.remove(*key);
    }
    fields
}

pub(crate) fn require_email(email: &str) -> workify_core::DomainResult<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(workify_core::DomainError::validation("email cannot be empty"));
    }
    Ok(email.to_string())
}
