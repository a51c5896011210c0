//! Request binding and field validation.
//!
//! `ValidatedJson<T>` deserializes the body and then runs `T::validate`, so a
//! handler only ever sees a payload that passed every field rule. Failures are
//! collected per field and rendered as `{"errors": {"<field>": [..]}}`.

use std::collections::BTreeMap;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::ApiError;

pub const BLANK: &str = "can't be blank";
pub const INVALID_EMAIL: &str = "is invalid";

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trim and lower-case an email before it is validated or looked up.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validation failures keyed by field name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<&'static str>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: &'static str) {
        self.0.entry(field).or_default().push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&[&'static str]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn require(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, BLANK);
        }
    }

    pub fn email(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, BLANK);
        } else if !is_valid_email(value) {
            self.add(field, INVALID_EMAIL);
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;

        if let Err(errors) = value.validate() {
            let fields: Vec<&str> = errors.fields().collect();
            warn!(?fields, "validation failed");
            return Err(ApiError::Validation(errors));
        }

        Ok(Self(value))
    }
}

/// Distinguishes an explicit `null` from an absent field when used with
/// `#[serde(default, deserialize_with = "present")]` on an `Option<Option<T>>`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_syntax() {
        assert!(is_valid_email("jake@jake.jake"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_email("  Jake@Example.COM "), "jake@example.com");
    }

    #[test]
    fn field_errors_collect_per_field() {
        let mut errors = FieldErrors::new();
        errors.require("username", "  ");
        errors.email("email", "nope");
        errors.require("password", "hunter2");

        assert_eq!(errors.get("username"), Some(&[BLANK][..]));
        assert_eq!(errors.get("email"), Some(&[INVALID_EMAIL][..]));
        assert!(errors.get("password").is_none());

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["email"][0], "is invalid");
    }

    #[test]
    fn empty_errors_are_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "present")]
        bio: Option<Option<String>>,
    }

    #[test]
    fn present_distinguishes_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"bio":null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"bio":"hi"}"#).unwrap();

        assert_eq!(absent.bio, None);
        assert_eq!(null.bio, Some(None));
        assert_eq!(set.bio, Some(Some("hi".into())));
    }
}
