use super::{Credentials, Registration};
use crate::domain::{Session, User};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid registration: {0}")]
    InvalidRegistration(String),

    #[error("Session not found")]
    SessionNotFound,
}

/// Verifies who someone is.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, credentials: &Credentials) -> Result<User, AuthError>;
    fn register(&self, registration: &Registration) -> Result<User, AuthError>;
}

/// Where issued sessions live between requests.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: Session);
    fn get(&self, token: &str) -> Option<Session>;
    fn remove(&self, token: &str) -> Option<Session>;
}

pub struct AuthService {
    authenticator: Box<dyn Authenticator>,
    sessions: Box<dyn SessionStore>,
}

impl AuthService {
    pub fn new(authenticator: Box<dyn Authenticator>, sessions: Box<dyn SessionStore>) -> Self {
        Self {
            authenticator,
            sessions,
        }
    }

    pub fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let user = self.authenticator.authenticate(credentials)?;
        info!(user = %user.email, "User logged in");
        Ok(self.open_session(user))
    }

    pub fn signup(&self, registration: &Registration) -> Result<Session, AuthError> {
        validate_registration(registration)?;
        let user = self.authenticator.register(registration)?;
        info!(user = %user.email, role = ?user.role, "User registered");
        Ok(self.open_session(user))
    }

    pub fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions
            .remove(token)
            .map(|_| ())
            .ok_or(AuthError::SessionNotFound)
    }

    pub fn current_user(&self, token: &str) -> Result<User, AuthError> {
        self.sessions
            .get(token)
            .map(|session| session.user)
            .ok_or(AuthError::SessionNotFound)
    }

    fn open_session(&self, user: User) -> Session {
        let session = Session::new(user);
        self.sessions.insert(session.clone());
        session
    }
}

fn validate_registration(registration: &Registration) -> Result<(), AuthError> {
    if registration.name.trim().chars().count() < 2 {
        return Err(AuthError::InvalidRegistration(
            "Name must be at least 2 characters".to_string(),
        ));
    }

    if !is_plausible_email(registration.email.trim()) {
        return Err(AuthError::InvalidRegistration(
            "Invalid email address".to_string(),
        ));
    }

    if registration.password.chars().count() < 6 {
        return Err(AuthError::InvalidRegistration(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !email.contains(char::is_whitespace)
                && domain
                    .rsplit_once('.')
                    .map(|(host, tld)| !host.is_empty() && tld.len() >= 2)
                    .unwrap_or(false)
        }
        None => false,
    }
}
