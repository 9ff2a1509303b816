use crate::errors::GenericError;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error("Account is disabled")]
    InactiveAccount,
    #[error("{0}")]
    InvalidJWT(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
    #[error("{0}")]
    DatabaseError(String, anyhow::Error),
}

impl std::fmt::Debug for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<AuthError> for GenericError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials(_) | AuthError::InactiveAccount => {
                GenericError::InvalidJWT(err.to_string())
            }
            AuthError::InvalidJWT(message) => GenericError::InvalidJWT(message),
            AuthError::UnexpectedError(error) => GenericError::UnexpectedError(error),
            AuthError::DatabaseError(message, error) => GenericError::DatabaseError(message, error),
        }
    }
}

#[derive(thiserror::Error)]
pub enum UserRegistrationError {
    #[error("Email is already registered")]
    DuplicateEmail,
    #[error("{0}")]
    InvalidInput(String),
    #[error("Insufficient privilege to register an admin account")]
    InsufficientPrivilege,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
    #[error("{0}")]
    DatabaseError(String, anyhow::Error),
}

impl std::fmt::Debug for UserRegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<UserRegistrationError> for GenericError {
    fn from(err: UserRegistrationError) -> Self {
        match err {
            UserRegistrationError::DuplicateEmail => GenericError::conflict(err.to_string()),
            UserRegistrationError::InvalidInput(message) => GenericError::ValidationError(message),
            UserRegistrationError::InsufficientPrivilege => {
                GenericError::InsufficientPrivilegeError(err.to_string())
            }
            UserRegistrationError::UnexpectedError(error) => GenericError::UnexpectedError(error),
            UserRegistrationError::DatabaseError(message, error) => {
                GenericError::DatabaseError(message, error)
            }
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum VerificationError {
    #[error("Email is already verified")]
    AlreadyVerified,
    #[error("No verification code has been issued")]
    NotIssued,
    #[error("Verification code has expired")]
    Expired,
    #[error("Too many failed attempts, request a new code")]
    TooManyAttempts,
    #[error("Verification code is incorrect")]
    IncorrectCode,
    #[error("Resend limit reached")]
    ResendLimitReached,
    #[error("Please wait {0} seconds before requesting a new code")]
    Cooldown(i64),
}

impl From<VerificationError> for GenericError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::AlreadyVerified
            | VerificationError::ResendLimitReached
            | VerificationError::Cooldown(_) => GenericError::conflict(err.to_string()),
            VerificationError::NotIssued => GenericError::DataNotFound(err.to_string()),
            VerificationError::Expired
            | VerificationError::TooManyAttempts
            | VerificationError::IncorrectCode => GenericError::ValidationError(err.to_string()),
        }
    }
}
