use std::collections::HashMap;
use std::sync::Arc;

use actix_web::dev::{Payload, ServiceRequest};
use actix_web::rt::task::JoinHandle;
use actix_web::web::Bytes;
use anyhow::{anyhow, Context};
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm as JWTAlgorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::{Rng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::configuration::EmailClientSettings;
use crate::email_client::{DummyEmailClient, EmailServicePool, GenericEmailService, SmtpEmailClient};
use crate::errors::CustomJWTTokenError;
use crate::schemas::{CommunicationType, JWTClaims, TokenType};

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

pub fn spawn_blocking_with_tracing<F, R>(f: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let current_span = tracing::Span::current();
    actix_web::rt::task::spawn_blocking(move || current_span.in_scope(f))
}

pub fn get_header_value(req: &ServiceRequest, header_name: &str) -> Option<String> {
    req.headers()
        .get(header_name)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.to_string())
}

pub fn bytes_to_payload(buf: Bytes) -> Payload {
    let (_, mut pl) = actix_http::h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}

#[tracing::instrument(name = "Create email type pool", skip(email_config))]
pub fn create_email_type_pool(
    email_config: &EmailClientSettings,
) -> Result<EmailServicePool, anyhow::Error> {
    let client: Arc<dyn GenericEmailService> = if email_config.use_dummy {
        Arc::new(DummyEmailClient::new())
    } else {
        Arc::new(
            SmtpEmailClient::new(email_config)
                .map_err(|e| anyhow!("Failed to create SmtpEmailClient: {}", e))?,
        )
    };
    let mut email_services = HashMap::new();
    email_services.insert(CommunicationType::Transactional, client);
    Ok(email_services)
}

#[tracing::instrument(name = "Generate JWT token for user", skip(secret))]
pub fn generate_jwt_token_for_user(
    user_id: Uuid,
    expiry_minutes: i64,
    token_type: TokenType,
    secret: &SecretString,
) -> Result<SecretString, anyhow::Error> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::minutes(expiry_minutes))
        .context("Token expiry is out of range")?
        .timestamp() as usize;
    let claims = JWTClaims {
        sub: user_id,
        exp: expiration,
        token_type,
    };
    let header = Header::new(JWTAlgorithm::HS256);
    let encoding_key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
    let token = encode(&header, &claims, &encoding_key).context("Failed to generate token")?;
    Ok(SecretString::from(token))
}

#[tracing::instrument(name = "Decode JWT token", skip(token, secret))]
pub fn decode_token<T: Into<String>>(
    token: T,
    secret: &SecretString,
    expected_type: TokenType,
) -> Result<Uuid, CustomJWTTokenError> {
    let decoding_key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let decoded = decode::<JWTClaims>(
        &token.into(),
        &decoding_key,
        &Validation::new(JWTAlgorithm::HS256),
    );
    match decoded {
        Ok(token) if token.claims.token_type == expected_type => Ok(token.claims.sub),
        Ok(_) => Err(CustomJWTTokenError::Invalid("Invalid Token".to_string())),
        Err(e) => match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(CustomJWTTokenError::Expired),
            _ => Err(CustomJWTTokenError::Invalid("Invalid Token".to_string())),
        },
    }
}

/// Argon2id hash in PHC string format. Used for passwords and for email
/// verification codes.
pub fn compute_secret_hash(secret: SecretString) -> Result<SecretString, anyhow::Error> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| anyhow!("Failed to encode salt: {}", e))?;
    let params =
        Params::new(15000, 2, 1, None).map_err(|e| anyhow!("Invalid argon2 params: {}", e))?;
    let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(secret.expose_secret().as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash secret: {}", e))?
        .to_string();
    Ok(SecretString::from(hash))
}

pub fn verify_secret_hash(
    expected_hash: SecretString,
    candidate: SecretString,
) -> Result<bool, anyhow::Error> {
    let expected_hash = PasswordHash::new(expected_hash.expose_secret())
        .map_err(|e| anyhow!("Failed to parse hash in PHC string format: {}", e))?;
    Ok(Argon2::default()
        .verify_password(candidate.expose_secret().as_bytes(), &expected_hash)
        .is_ok())
}

pub fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

pub fn generate_numeric_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

pub fn generate_opaque_token() -> SecretString {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    SecretString::from(URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use secrecy::{ExposeSecret, SecretString};
    use uuid::Uuid;

    use super::{
        compute_secret_hash, decode_token, generate_jwt_token_for_user, generate_numeric_code,
        generate_opaque_token, sha256_hex, verify_secret_hash,
    };
    use crate::errors::CustomJWTTokenError;
    use crate::schemas::TokenType;

    #[test]
    fn test_jwt_round_trip_checks_token_type() {
        let secret = SecretString::from("unit-test-secret");
        let user_id = Uuid::new_v4();
        let token = generate_jwt_token_for_user(user_id, 5, TokenType::Access, &secret).unwrap();

        let decoded = decode_token(token.expose_secret(), &secret, TokenType::Access);
        assert_eq!(decoded.unwrap(), user_id);

        let wrong_type = decode_token(token.expose_secret(), &secret, TokenType::Refresh);
        assert!(matches!(wrong_type, Err(CustomJWTTokenError::Invalid(_))));
    }

    #[test]
    fn test_expired_jwt_is_reported_as_expired() {
        let secret = SecretString::from("unit-test-secret");
        let token =
            generate_jwt_token_for_user(Uuid::new_v4(), -10, TokenType::Access, &secret).unwrap();
        let decoded = decode_token(token.expose_secret(), &secret, TokenType::Access);
        assert!(matches!(decoded, Err(CustomJWTTokenError::Expired)));
    }

    #[test]
    fn test_secret_hash_verifies_only_the_original() {
        let hash = compute_secret_hash(SecretString::from("483920")).unwrap();
        assert!(verify_secret_hash(hash.clone(), SecretString::from("483920")).unwrap());
        assert!(!verify_secret_hash(hash, SecretString::from("483921")).unwrap());
    }

    #[test]
    fn test_generated_codes_and_tokens() {
        let code = generate_numeric_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
        assert_ne!(
            generate_opaque_token().expose_secret(),
            generate_opaque_token().expose_secret()
        );
        assert_eq!(sha256_hex("abc").len(), 64);
    }
}
