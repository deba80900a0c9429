//! Account commands.
//!
//! # Usage
//!
//! ```bash
//! # Sign in; the password is read from stdin when --password is omitted
//! echo "$PASSWORD" | emporium auth login --email jane@example.com
//! export EMPORIUM_API_TOKEN=...   # printed by login and signup
//!
//! emporium auth signup --name "Jane Smith" --email jane@example.com
//! emporium auth whoami
//! emporium auth password          # reads current, then new password
//! emporium auth logout
//! ```

use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use emporium_storefront::{AuthSession, Credentials, NewAccount, PasswordChange};

use super::{CliError, Session};
use crate::output;

/// Signup form fields other than the password.
pub struct SignupArgs {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

pub async fn signup(session: &Session, args: SignupArgs) -> Result<(), CliError> {
    let mut stdin = SecretInput::new();
    let account = NewAccount {
        name: args.name,
        email: args.email,
        password: stdin.secret(args.password, "Password").await?,
        phone: args.phone,
        address: args.address,
    };

    let auth = session.client.signup(&account).await?;
    output::line("Account created.");
    signed_in(&auth);
    Ok(())
}

pub async fn login(
    session: &Session,
    email: String,
    password: Option<String>,
) -> Result<(), CliError> {
    let password = SecretInput::new().secret(password, "Password").await?;
    let auth = session
        .client
        .login(&Credentials::new(email, password))
        .await?;
    signed_in(&auth);
    Ok(())
}

pub async fn whoami(session: &Session) -> Result<(), CliError> {
    let user = session.client.me().await?;
    output::user(&user);
    Ok(())
}

pub async fn logout(session: &Session) -> Result<(), CliError> {
    session.client.logout().await?;
    output::line("Logged out. Unset EMPORIUM_API_TOKEN to forget the session.");
    Ok(())
}

pub async fn change_password(
    session: &Session,
    old: Option<String>,
    new: Option<String>,
) -> Result<(), CliError> {
    let mut stdin = SecretInput::new();
    let change = PasswordChange {
        old_password: stdin.secret(old, "Current password").await?,
        new_password: stdin.secret(new, "New password").await?,
    };

    session.client.change_password(&change).await?;
    output::line("Password changed.");
    Ok(())
}

fn signed_in(auth: &AuthSession) {
    output::user(&auth.user);
    match &auth.token {
        Some(token) => output::line(&format!(
            "export EMPORIUM_API_TOKEN={}",
            token.expose_secret()
        )),
        None => output::line("The service did not issue a bearer token."),
    }
}

/// Secrets given as flags, or read line by line from stdin.
struct SecretInput {
    lines: Lines<BufReader<Stdin>>,
}

impl SecretInput {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn secret(&mut self, given: Option<String>, what: &str) -> Result<SecretString, CliError> {
        let value = match given {
            Some(value) => value,
            None => self
                .lines
                .next_line()
                .await?
                .ok_or_else(|| CliError::InvalidArgument(format!("{what} is required")))?,
        };
        Ok(SecretString::from(value.trim_end_matches('\r').to_string()))
    }
}
