use serde::{Deserialize, Serialize};

use crate::{
    auth::password::{hash_password, PasswordError},
    users::repo_types::{User, UserChanges},
    validation::{normalize_email, present, FieldErrors, Validate},
};

/// `{"user": {...}}` wrapper used by every request and response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserBody<T> {
    pub user: T,
}

impl<T: Validate> Validate for UserBody<T> {
    fn validate(&self) -> Result<(), FieldErrors> {
        self.user.validate()
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for RegisterUser {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("username", &self.username);
        errors.email("email", &normalize_email(&self.email));
        errors.require("password", &self.password);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for LoginUser {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.email("email", &normalize_email(&self.email));
        errors.require("password", &self.password);
        errors.into_result()
    }
}

/// Partial update. Absent fields are left alone; `bio`/`image` may be `null`
/// to clear them. A present `password` is always treated as a new plaintext.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub image: Option<Option<String>>,
}

impl Validate for UpdateUser {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(username) = &self.username {
            errors.require("username", username);
        }
        if let Some(email) = &self.email {
            errors.email("email", &normalize_email(email));
        }
        if let Some(password) = &self.password {
            errors.require("password", password);
        }
        errors.into_result()
    }
}

impl UpdateUser {
    /// Maps the request onto store changes. The password is hashed only when
    /// the field was sent.
    pub fn into_changes(self) -> Result<UserChanges, PasswordError> {
        let password_hash = self.password.as_deref().map(hash_password).transpose()?;
        Ok(UserChanges {
            username: self.username.map(|u| u.trim().to_string()),
            email: self.email.as_deref().map(normalize_email),
            password_hash,
            bio: self.bio,
            image: self.image,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub token: String,
}

impl UserResponse {
    pub fn new(user: User, token: String) -> UserBody<Self> {
        UserBody {
            user: Self {
                username: user.username,
                email: user.email,
                bio: user.bio,
                image: user.image,
                token,
            },
        }
    }
}
