use crate::application::{AuthError, Authenticator, Credentials, Registration};
use crate::domain::{Role, User};
use lazy_static::lazy_static;
use sha2::{Digest, Sha256};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password_digest: String,
}

impl Account {
    fn new(id: &str, name: &str, email: &str, password: &str, role: Role) -> Self {
        let email = email.trim().to_lowercase();
        Self {
            password_digest: password_digest(&email, password),
            user: User {
                id: id.to_string(),
                name: name.to_string(),
                email,
                role,
            },
        }
    }
}

lazy_static! {
    static ref DEMO_ACCOUNTS: Vec<Account> = vec![
        Account::new("1", "Dr. Smith", "lecturer@demo.com", "lecturer123", Role::Lecturer),
        Account::new("2", "John Doe", "student@demo.com", "student123", Role::Student),
    ];
}

/// Hex SHA-256 of `email:password`; the email salts identical passwords apart.
fn password_digest(email: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Account list seeded with the two demo users. Sign-ups live until restart.
pub struct DemoAuthenticator {
    accounts: Mutex<Vec<Account>>,
}

impl DemoAuthenticator {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(DEMO_ACCOUNTS.clone()),
        }
    }
}

impl Default for DemoAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl Authenticator for DemoAuthenticator {
    fn authenticate(&self, credentials: &Credentials) -> Result<User, AuthError> {
        let email = credentials.email.trim().to_lowercase();
        let digest = password_digest(&email, &credentials.password);
        let accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());

        accounts
            .iter()
            .find(|account| account.user.email == email && account.password_digest == digest)
            .map(|account| account.user.clone())
            .ok_or(AuthError::InvalidCredentials)
    }

    fn register(&self, registration: &Registration) -> Result<User, AuthError> {
        let email = registration.email.trim().to_lowercase();
        let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());

        if accounts.iter().any(|account| account.user.email == email) {
            return Err(AuthError::EmailTaken);
        }

        let account = Account::new(
            &uuid::Uuid::new_v4().to_string(),
            registration.name.trim(),
            &email,
            &registration.password,
            registration.role,
        );
        let user = account.user.clone();
        accounts.push(account);

        Ok(user)
    }
}
