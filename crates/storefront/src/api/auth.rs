//! Account endpoints: signup, login, session lookup, logout, password change.
//!
//! Passwords stay in [`SecretString`] until the request body is built. Inputs
//! are checked locally first, so an obviously bad form never reaches the
//! service.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument};

use emporium_core::User;

use super::wire::{AuthData, ChangePasswordBody, LoginBody, SignupBody, UserData};
use super::{ApiClient, ApiError};

/// Shortest password the service accepts for new accounts and changes.
pub const MIN_PASSWORD_LEN: usize = 6;

const MIN_NAME_LEN: usize = 2;

/// Email and password for `POST /auth/login`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }

    fn validate(&self) -> Result<(), ApiError> {
        validate_email(&self.email)?;
        if self.password.expose_secret().is_empty() {
            return Err(invalid("Password is required"));
        }
        Ok(())
    }
}

/// Registration form for `POST /auth/signup`.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl NewAccount {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().chars().count() < MIN_NAME_LEN {
            return Err(invalid("Name must be at least 2 characters"));
        }
        validate_email(&self.email)?;
        validate_new_password(&self.password)
    }
}

/// Body of `PATCH /auth/change-password`.
#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub old_password: SecretString,
    pub new_password: SecretString,
}

impl PasswordChange {
    fn validate(&self) -> Result<(), ApiError> {
        if self.old_password.expose_secret().is_empty() {
            return Err(invalid("Current password is required"));
        }
        validate_new_password(&self.new_password)
    }
}

/// A signed-in account, plus the bearer token when the service issued one.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: Option<SecretString>,
}

impl AuthSession {
    fn from_data(data: AuthData) -> Result<Self, ApiError> {
        Ok(Self {
            user: User::try_from(data.user)?,
            token: data
                .token
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from),
        })
    }
}

fn invalid(reason: &str) -> ApiError {
    ApiError::InvalidInput(reason.to_string())
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
        })
        && !email.chars().any(char::is_whitespace);

    if valid {
        Ok(())
    } else {
        Err(invalid("Invalid email address"))
    }
}

fn validate_new_password(password: &SecretString) -> Result<(), ApiError> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid("Password must be at least 6 characters"));
    }
    Ok(())
}

impl ApiClient {
    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a request when the form is
    /// incomplete, or the API error (e.g. email already registered).
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn signup(&self, account: &NewAccount) -> Result<AuthSession, ApiError> {
        account.validate()?;

        let request = self
            .request(Method::POST, &["auth", "signup"])?
            .json(&SignupBody {
                name: account.name.trim(),
                email: account.email.trim(),
                password: account.password.expose_secret(),
                phone: account.phone.as_deref().filter(|p| !p.trim().is_empty()),
                address: account.address.as_deref().filter(|a| !a.trim().is_empty()),
            });
        let data = self
            .execute::<AuthData>(request)
            .await?
            .into_data("signup")?;
        let session = AuthSession::from_data(data)?;

        info!(user_id = %session.user.id, "Account created");
        Ok(session)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a request for a malformed
    /// email or empty password, or [`ApiError::Unauthorized`] for bad
    /// credentials.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession, ApiError> {
        credentials.validate()?;

        let request = self
            .request(Method::POST, &["auth", "login"])?
            .json(&LoginBody {
                email: credentials.email.trim(),
                password: credentials.password.expose_secret(),
            });
        let data = self
            .execute::<AuthData>(request)
            .await?
            .into_data("login")?;
        let session = AuthSession::from_data(data)?;

        info!(user_id = %session.user.id, role = %session.user.role, "Logged in");
        Ok(session)
    }

    /// The account behind the current session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when there is no valid session.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ApiError> {
        let request = self.request(Method::GET, &["auth", "me"])?;
        let data = self.execute::<UserData>(request).await?.into_data("user")?;
        Ok(User::try_from(data.user)?)
    }

    /// End the current session on the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let request = self.request(Method::POST, &["auth", "logout"])?;
        self.execute_unit(request).await
    }

    /// Replace the session user's password.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a request when the new
    /// password is too short, or the API error (e.g. wrong current password).
    #[instrument(skip(self, change))]
    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), ApiError> {
        change.validate()?;

        let request = self
            .request(Method::PATCH, &["auth", "change-password"])?
            .json(&ChangePasswordBody {
                old_password: change.old_password.expose_secret(),
                new_password: change.new_password.expose_secret(),
            });
        self.execute_unit(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("jane@example.com").is_ok());
        assert!(validate_email("jane@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("jane @example.com").is_err());
        assert!(validate_email("jane@example.").is_err());
        assert!(validate_email("jane").is_err());
    }

    #[test]
    fn test_login_requires_password() {
        let credentials = Credentials::new("jane@example.com", secret(""));
        let error = credentials.validate().unwrap_err();
        assert_eq!(error.server_message(), Some("Password is required"));
    }

    #[test]
    fn test_signup_checks_name_and_password_length() {
        let mut account = NewAccount {
            name: "J".to_string(),
            email: "jane@example.com".to_string(),
            password: secret("hunter22"),
            phone: None,
            address: None,
        };
        assert!(matches!(account.validate(), Err(ApiError::InvalidInput(_))));

        account.name = "Jane".to_string();
        assert!(account.validate().is_ok());

        account.password = secret("12345");
        assert!(account.validate().is_err());
    }

    #[test]
    fn test_password_change_rules() {
        let change = PasswordChange {
            old_password: secret(""),
            new_password: secret("long-enough"),
        };
        assert!(change.validate().is_err());

        let change = PasswordChange {
            old_password: secret("old"),
            new_password: secret("short"),
        };
        assert!(change.validate().is_err());

        let change = PasswordChange {
            old_password: secret("old"),
            new_password: secret("123456"),
        };
        assert!(change.validate().is_ok());
    }

    #[test]
    fn test_blank_token_is_treated_as_cookie_session() {
        let data: AuthData = serde_json::from_value(serde_json::json!({
            "user": { "id": "u-1", "name": "Jane", "email": "jane@example.com", "role": "CUSTOMER" },
            "token": "  "
        }))
        .unwrap();
        let session = AuthSession::from_data(data).unwrap();
        assert!(session.token.is_none());
        assert!(!session.user.is_admin());
    }
}
