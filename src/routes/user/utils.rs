use anyhow::{anyhow, Context};
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use uuid::Uuid;

use super::errors::{AuthError, UserRegistrationError, VerificationError};
use super::models::{EmailVerificationModel, UserAccountModel};
use super::schemas::{AuthData, CreateUserAccount, UserAccount, UserRole};
use crate::configuration::{UserSettings, JWT};
use crate::constants::{
    VERIFICATION_MAX_ATTEMPTS, VERIFICATION_MAX_RESENDS,
    VERIFICATION_RESEND_COOLDOWN_SECONDS, VERIFICATION_CODE_TTL_MINUTES,
    VERIFICATION_CODE_LENGTH,
};
use crate::domain::EmailObject;
use crate::email_client::GenericEmailService;
use crate::schemas::TokenType;
use crate::utils::{
    compute_secret_hash, generate_jwt_token_for_user, generate_numeric_code, sha256_hex,
    spawn_blocking_with_tracing, verify_secret_hash,
};

const USER_COLUMNS: &str = "id, email, full_name, phone_number, password_hash, role, is_active, \
                            email_verified, refresh_token_hash, created_on";

#[tracing::instrument(name = "Fetch user account model", skip(pool))]
async fn fetch_user_account_model(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<UserAccountModel>, anyhow::Error> {
    let query = format!(
        "SELECT {} FROM user_account WHERE id = $1 AND deleted_on IS NULL",
        USER_COLUMNS
    );
    let row = sqlx::query_as::<_, UserAccountModel>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching user")
        })?;
    Ok(row)
}

#[tracing::instrument(name = "Fetch user account by email", skip(pool))]
async fn fetch_user_account_model_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserAccountModel>, anyhow::Error> {
    let query = format!(
        "SELECT {} FROM user_account WHERE email = $1 AND deleted_on IS NULL",
        USER_COLUMNS
    );
    let row = sqlx::query_as::<_, UserAccountModel>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            anyhow::Error::new(e).context("A database failure occurred while fetching user")
        })?;
    Ok(row)
}

#[tracing::instrument(name = "Fetch user account", skip(pool))]
pub async fn fetch_user_account(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<UserAccount>, anyhow::Error> {
    Ok(fetch_user_account_model(pool, user_id)
        .await?
        .map(UserAccountModel::into_schema))
}

#[tracing::instrument(name = "Fetch admin user ids", skip(executor))]
pub async fn fetch_admin_user_ids<'a, E>(executor: E) -> Result<Vec<Uuid>, anyhow::Error>
where
    E: sqlx::PgExecutor<'a>,
{
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM user_account WHERE role = 'admin' AND is_active AND deleted_on IS NULL",
    )
    .fetch_all(executor)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while fetching admins")
    })?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Role granted at registration. Admin is only available to addresses on
/// the configured allow list.
pub fn resolve_registration_role(
    requested: Option<UserRole>,
    email: &EmailObject,
    settings: &UserSettings,
) -> Result<UserRole, UserRegistrationError> {
    match requested.unwrap_or(UserRole::Customer) {
        UserRole::Customer => Ok(UserRole::Customer),
        UserRole::Admin => {
            let allowed = settings
                .admin_list
                .iter()
                .any(|admin| admin.trim().eq_ignore_ascii_case(email.as_ref()));
            if allowed {
                Ok(UserRole::Admin)
            } else {
                Err(UserRegistrationError::InsufficientPrivilege)
            }
        }
    }
}

#[tracing::instrument(name = "Register user", skip(pool, user, settings), fields(email = %user.email))]
pub async fn register_user(
    pool: &PgPool,
    user: CreateUserAccount,
    settings: &UserSettings,
) -> Result<UserAccount, UserRegistrationError> {
    let role = resolve_registration_role(user.role, &user.email, settings)?;
    if user.password.expose_secret().len() < 8 {
        return Err(UserRegistrationError::InvalidInput(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if fetch_user_account_model_by_email(pool, user.email.as_ref())
        .await?
        .is_some()
    {
        return Err(UserRegistrationError::DuplicateEmail);
    }

    let password = user.password;
    let password_hash = spawn_blocking_with_tracing(move || compute_secret_hash(password))
        .await
        .context("Failed to spawn blocking task")??;

    let query = format!(
        "INSERT INTO user_account (id, email, full_name, phone_number, password_hash, role, \
         is_active, email_verified, created_on) VALUES ($1, $2, $3, $4, $5, $6, true, false, $7) \
         RETURNING {}",
        USER_COLUMNS
    );
    let row = sqlx::query_as::<_, UserAccountModel>(&query)
        .bind(Uuid::new_v4())
        .bind(user.email.as_ref())
        .bind(user.full_name.trim())
        .bind(&user.phone_number)
        .bind(password_hash.expose_secret())
        .bind(role)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let Some(db_error) = e.as_database_error() {
                if db_error.is_unique_violation() {
                    return UserRegistrationError::DuplicateEmail;
                }
            }
            tracing::error!("Failed to execute query: {:?}", e);
            UserRegistrationError::DatabaseError(
                "A database failure occurred while saving user account".to_string(),
                e.into(),
            )
        })?;
    Ok(row.into_schema())
}

#[tracing::instrument(name = "Validate credentials", skip(pool, password))]
pub async fn validate_user_credentials(
    pool: &PgPool,
    email: &str,
    password: SecretString,
) -> Result<UserAccount, AuthError> {
    let email = email.trim().to_lowercase();
    let user = fetch_user_account_model_by_email(pool, &email).await?;

    // Hash against a fixed PHC string when the user is unknown so both paths
    // take the same time.
    let expected_hash = user
        .as_ref()
        .map(|u| SecretString::from(u.password_hash.clone()))
        .unwrap_or_else(|| {
            SecretString::from(
                "$argon2id$v=19$m=15000,t=2,p=1$\
                gZiV/M1gPc22ElAH/Jh1Hw$\
                CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno",
            )
        });
    let is_valid = spawn_blocking_with_tracing(move || verify_secret_hash(expected_hash, password))
        .await
        .context("Failed to spawn blocking task")??;

    match user {
        Some(user) if is_valid => {
            if !user.is_active {
                return Err(AuthError::InactiveAccount);
            }
            Ok(user.into_schema())
        }
        _ => Err(AuthError::InvalidCredentials(anyhow!(
            "Unknown email or wrong password"
        ))),
    }
}

#[tracing::instrument(name = "Issue auth tokens", skip(pool, jwt))]
pub async fn issue_auth_data(
    pool: &PgPool,
    user: UserAccount,
    jwt: &JWT,
) -> Result<AuthData, AuthError> {
    let access_token = generate_jwt_token_for_user(
        user.id,
        jwt.access_expiry_minutes,
        TokenType::Access,
        &jwt.secret,
    )?;
    let refresh_token = generate_jwt_token_for_user(
        user.id,
        jwt.refresh_expiry_minutes,
        TokenType::Refresh,
        &jwt.secret,
    )?;

    sqlx::query("UPDATE user_account SET refresh_token_hash = $1, updated_on = $2 WHERE id = $3")
        .bind(sha256_hex(refresh_token.expose_secret()))
        .bind(Utc::now())
        .bind(user.id)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            AuthError::DatabaseError(
                "A database failure occurred while storing refresh token".to_string(),
                e.into(),
            )
        })?;

    Ok(AuthData {
        user,
        access_token: access_token.expose_secret().to_string(),
        refresh_token: refresh_token.expose_secret().to_string(),
        token_type: "Bearer".to_string(),
        expires_in: jwt.access_expiry_minutes * 60,
    })
}

#[tracing::instrument(name = "Refresh auth tokens", skip(pool, refresh_token, jwt))]
pub async fn refresh_auth_data(
    pool: &PgPool,
    refresh_token: SecretString,
    jwt: &JWT,
) -> Result<AuthData, AuthError> {
    let user_id = crate::utils::decode_token(
        refresh_token.expose_secret(),
        &jwt.secret,
        TokenType::Refresh,
    )
    .map_err(|e| AuthError::InvalidJWT(e.to_string()))?;

    let user = fetch_user_account_model(pool, user_id)
        .await?
        .ok_or_else(|| AuthError::InvalidJWT("User not found".to_string()))?;
    let presented_hash = sha256_hex(refresh_token.expose_secret());
    if user.refresh_token_hash.as_deref() != Some(presented_hash.as_str()) {
        return Err(AuthError::InvalidJWT(
            "Refresh token has been revoked".to_string(),
        ));
    }
    if !user.is_active {
        return Err(AuthError::InactiveAccount);
    }
    issue_auth_data(pool, user.into_schema(), jwt).await
}

/// Decides whether a new code may be sent. Returns the resend counter to
/// store alongside the new code.
pub fn check_resend_allowed(
    existing: Option<&EmailVerificationModel>,
    now: DateTime<Utc>,
) -> Result<i32, VerificationError> {
    let Some(record) = existing else {
        return Ok(0);
    };
    if record.verified_on.is_some() {
        return Err(VerificationError::AlreadyVerified);
    }
    let elapsed = (now - record.last_sent_on).num_seconds();
    if elapsed < VERIFICATION_RESEND_COOLDOWN_SECONDS {
        return Err(VerificationError::Cooldown(
            VERIFICATION_RESEND_COOLDOWN_SECONDS - elapsed,
        ));
    }
    // The resend window restarts once the previous code has lapsed.
    if record.expires_on <= now {
        return Ok(0);
    }
    if record.resend_count >= VERIFICATION_MAX_RESENDS {
        return Err(VerificationError::ResendLimitReached);
    }
    Ok(record.resend_count + 1)
}

/// Checks everything about a verification attempt except the code itself.
pub fn check_verification_attempt(
    record: &EmailVerificationModel,
    now: DateTime<Utc>,
) -> Result<(), VerificationError> {
    if record.verified_on.is_some() {
        return Err(VerificationError::AlreadyVerified);
    }
    if record.attempts >= VERIFICATION_MAX_ATTEMPTS {
        return Err(VerificationError::TooManyAttempts);
    }
    if record.expires_on <= now {
        return Err(VerificationError::Expired);
    }
    Ok(())
}

#[tracing::instrument(name = "Fetch email verification", skip(pool))]
async fn fetch_email_verification(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<EmailVerificationModel>, anyhow::Error> {
    sqlx::query_as::<_, EmailVerificationModel>(
        "SELECT id, user_id, code_hash, expires_on, attempts, resend_count, last_sent_on, \
         verified_on FROM email_verification WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while fetching verification")
    })
}

#[tracing::instrument(name = "Send verification code", skip(pool, email_client, user), fields(user_id = %user.id))]
pub async fn send_verification_code(
    pool: &PgPool,
    email_client: &dyn GenericEmailService,
    user: &UserAccount,
) -> Result<(), crate::errors::GenericError> {
    if user.email_verified {
        return Err(VerificationError::AlreadyVerified.into());
    }
    let now = Utc::now();
    let existing = fetch_email_verification(pool, user.id).await?;
    let resend_count = check_resend_allowed(existing.as_ref(), now)?;

    let code = generate_numeric_code(VERIFICATION_CODE_LENGTH);
    let secret = SecretString::from(code.clone());
    let code_hash = spawn_blocking_with_tracing(move || compute_secret_hash(secret))
        .await
        .context("Failed to spawn blocking task")??;

    sqlx::query(
        "INSERT INTO email_verification (id, user_id, code_hash, expires_on, attempts, \
         resend_count, last_sent_on, created_on) VALUES ($1, $2, $3, $4, 0, $5, $6, $6) \
         ON CONFLICT (user_id) DO UPDATE SET code_hash = EXCLUDED.code_hash, \
         expires_on = EXCLUDED.expires_on, attempts = 0, resend_count = EXCLUDED.resend_count, \
         last_sent_on = EXCLUDED.last_sent_on",
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(code_hash.expose_secret())
    .bind(now + Duration::minutes(VERIFICATION_CODE_TTL_MINUTES))
    .bind(resend_count)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        anyhow::Error::new(e).context("A database failure occurred while saving verification")
    })?;

    email_client
        .send_text_email(
            &user.email,
            "Verify your email",
            format!(
                "Hi {},\n\nYour verification code is {}. It expires in {} minutes.",
                user.full_name, code, VERIFICATION_CODE_TTL_MINUTES
            ),
        )
        .await?;
    Ok(())
}

#[tracing::instrument(name = "Send verification code by email", skip(pool, email_client))]
pub async fn send_verification_code_to_email(
    pool: &PgPool,
    email_client: &dyn GenericEmailService,
    email: &EmailObject,
) -> Result<(), crate::errors::GenericError> {
    let user = fetch_user_account_model_by_email(pool, email.as_ref())
        .await?
        .ok_or_else(|| crate::errors::GenericError::DataNotFound("User not found".to_string()))?
        .into_schema();
    send_verification_code(pool, email_client, &user).await
}

#[tracing::instrument(name = "Verify email", skip(pool, code))]
pub async fn verify_email(
    pool: &PgPool,
    email: &EmailObject,
    code: SecretString,
) -> Result<(), crate::errors::GenericError> {
    let user = fetch_user_account_model_by_email(pool, email.as_ref())
        .await?
        .ok_or_else(|| crate::errors::GenericError::DataNotFound("User not found".to_string()))?;
    if user.email_verified {
        return Err(VerificationError::AlreadyVerified.into());
    }
    let record = fetch_email_verification(pool, user.id)
        .await?
        .ok_or(VerificationError::NotIssued)?;
    let now = Utc::now();
    check_verification_attempt(&record, now)?;

    let expected = SecretString::from(record.code_hash.clone());
    let matches = spawn_blocking_with_tracing(move || verify_secret_hash(expected, code))
        .await
        .context("Failed to spawn blocking task")??;

    if !matches {
        sqlx::query("UPDATE email_verification SET attempts = attempts + 1 WHERE id = $1")
            .bind(record.id)
            .execute(pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to execute query: {:?}", e);
                anyhow::Error::new(e).context("A database failure occurred while counting attempt")
            })?;
        return Err(VerificationError::IncorrectCode.into());
    }

    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;
    sqlx::query("UPDATE email_verification SET verified_on = $1 WHERE id = $2")
        .bind(now)
        .bind(record.id)
        .execute(&mut *transaction)
        .await
        .context("A database failure occurred while marking code used")?;
    sqlx::query("UPDATE user_account SET email_verified = true, updated_on = $1 WHERE id = $2")
        .bind(now)
        .bind(user.id)
        .execute(&mut *transaction)
        .await
        .context("A database failure occurred while verifying user")?;
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to verify email")?;
    Ok(())
}
