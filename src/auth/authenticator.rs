use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
}

/// Outcome of a sign-in attempt: a user on success, a message otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub success: bool,
    pub user: Option<User>,
    pub error: Option<String>,
}

impl LoginResult {
    fn ok(user: User) -> Self {
        LoginResult {
            success: true,
            user: Some(user),
            error: None,
        }
    }

    fn failed(message: &str) -> Self {
        LoginResult {
            success: false,
            user: None,
            error: Some(message.to_string()),
        }
    }
}

/// Session gate for admin operations.
pub trait Authenticator {
    fn login(&mut self, email: &str, password: &str) -> LoginResult;
    fn logout(&mut self);
    fn is_authenticated(&self) -> bool;
    fn current_user(&self) -> Option<&User>;
}

/// One configured admin account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCredential {
    pub email: String,

    /// Lowercase hex SHA-1 of the password
    pub password_sha1: String,
}

impl AdminCredential {
    pub fn new(email: &str, password: &str) -> Self {
        AdminCredential {
            email: email.to_string(),
            password_sha1: password_digest(password),
        }
    }
}

pub fn password_digest(password: &str) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Checks sign-ins against a fixed list of admin accounts.
#[derive(Debug, Clone, Default)]
pub struct CredentialAuthenticator {
    admins: Vec<AdminCredential>,
    current: Option<User>,
}

impl CredentialAuthenticator {
    pub fn new(admins: Vec<AdminCredential>) -> Self {
        CredentialAuthenticator {
            admins,
            current: None,
        }
    }
}

impl Authenticator for CredentialAuthenticator {
    fn login(&mut self, email: &str, password: &str) -> LoginResult {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return LoginResult::failed("Email and password are required");
        }

        let digest = password_digest(password);
        let matched = self
            .admins
            .iter()
            .any(|a| a.email.eq_ignore_ascii_case(email) && a.password_sha1.eq_ignore_ascii_case(&digest));

        if !matched {
            warn!("Failed sign-in for {}", email);
            self.current = None;
            return LoginResult::failed("Invalid email or password");
        }

        let user = User {
            email: email.to_string(),
        };
        info!("Signed in as {}", user.email);
        self.current = Some(user.clone());
        LoginResult::ok(user)
    }

    fn logout(&mut self) {
        if let Some(user) = self.current.take() {
            info!("Signed out {}", user.email);
        }
    }

    fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }
}
