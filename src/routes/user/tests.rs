#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use secrecy::SecretString;
    use uuid::Uuid;

    use crate::configuration::UserSettings;
    use crate::domain::EmailObject;
    use crate::errors::GenericError;
    use crate::routes::user::errors::{UserRegistrationError, VerificationError};
    use crate::routes::user::models::EmailVerificationModel;
    use crate::routes::user::schemas::{CreateUserAccount, UserRole};
    use crate::routes::user::utils::{
        check_resend_allowed, check_verification_attempt, register_user,
        resolve_registration_role, validate_user_credentials,
    };
    use crate::tests::tests::get_test_pool;

    fn verification(sent_seconds_ago: i64, expires_in_minutes: i64) -> EmailVerificationModel {
        let now = Utc::now();
        EmailVerificationModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            code_hash: String::new(),
            expires_on: now + Duration::minutes(expires_in_minutes),
            attempts: 0,
            resend_count: 0,
            last_sent_on: now - Duration::seconds(sent_seconds_ago),
            verified_on: None,
        }
    }

    #[test]
    fn test_admin_role_requires_allow_list() {
        let settings = UserSettings {
            admin_list: vec!["Owner@Shop.vn".to_string()],
        };
        let owner = EmailObject::parse("owner@shop.vn".to_string()).unwrap();
        let stranger = EmailObject::parse("someone@shop.vn".to_string()).unwrap();

        assert_eq!(
            resolve_registration_role(Some(UserRole::Admin), &owner, &settings).unwrap(),
            UserRole::Admin
        );
        assert!(matches!(
            resolve_registration_role(Some(UserRole::Admin), &stranger, &settings),
            Err(UserRegistrationError::InsufficientPrivilege)
        ));
        assert_eq!(
            resolve_registration_role(None, &stranger, &settings).unwrap(),
            UserRole::Customer
        );
    }

    #[test]
    fn test_resend_respects_cooldown_and_limit() {
        let now = Utc::now();
        assert_eq!(check_resend_allowed(None, now), Ok(0));

        let recent = verification(10, 9);
        assert!(matches!(
            check_resend_allowed(Some(&recent), now),
            Err(VerificationError::Cooldown(_))
        ));

        let mut old = verification(120, 8);
        old.resend_count = 2;
        assert_eq!(check_resend_allowed(Some(&old), now), Ok(3));

        old.resend_count = 5;
        assert_eq!(
            check_resend_allowed(Some(&old), now),
            Err(VerificationError::ResendLimitReached)
        );

        // A lapsed code opens a fresh window.
        let mut lapsed = verification(900, -5);
        lapsed.resend_count = 5;
        assert_eq!(check_resend_allowed(Some(&lapsed), now), Ok(0));
    }

    #[test]
    fn test_verification_attempt_checks() {
        let now = Utc::now();
        let mut record = verification(30, 5);
        assert!(check_verification_attempt(&record, now).is_ok());

        record.attempts = 5;
        assert_eq!(
            check_verification_attempt(&record, now),
            Err(VerificationError::TooManyAttempts)
        );

        record.attempts = 1;
        record.expires_on = now - Duration::seconds(1);
        assert_eq!(
            check_verification_attempt(&record, now),
            Err(VerificationError::Expired)
        );

        record.verified_on = Some(now);
        assert_eq!(
            check_verification_attempt(&record, now),
            Err(VerificationError::AlreadyVerified)
        );
    }

    #[test]
    fn test_verification_errors_map_to_http_kinds() {
        assert!(matches!(
            GenericError::from(VerificationError::Cooldown(30)),
            GenericError::ConflictError(_, _)
        ));
        assert!(matches!(
            GenericError::from(VerificationError::IncorrectCode),
            GenericError::ValidationError(_)
        ));
        assert!(matches!(
            GenericError::from(VerificationError::NotIssued),
            GenericError::DataNotFound(_)
        ));
    }

    #[tokio::test]
    #[ignore = "requires a running postgres instance"]
    async fn test_register_then_authenticate() {
        let pool = get_test_pool().await;
        let email = format!("{}@example.com", Uuid::new_v4().simple());
        let settings = UserSettings { admin_list: vec![] };
        let request = CreateUserAccount {
            email: EmailObject::parse(email.clone()).unwrap(),
            password: SecretString::from("correct horse battery"),
            full_name: "Lan Nguyen".to_string(),
            phone_number: None,
            role: None,
        };
        let user = register_user(&pool, request, &settings).await.unwrap();
        assert_eq!(user.role, UserRole::Customer);
        assert!(!user.email_verified);

        let duplicate = CreateUserAccount {
            email: EmailObject::parse(email.to_uppercase()).unwrap(),
            password: SecretString::from("another password"),
            full_name: "Lan Nguyen".to_string(),
            phone_number: None,
            role: None,
        };
        assert!(matches!(
            register_user(&pool, duplicate, &settings).await,
            Err(UserRegistrationError::DuplicateEmail)
        ));

        let authenticated =
            validate_user_credentials(&pool, &email, SecretString::from("correct horse battery"))
                .await
                .unwrap();
        assert_eq!(authenticated.id, user.id);
        assert!(
            validate_user_credentials(&pool, &email, SecretString::from("wrong password"))
                .await
                .is_err()
        );
    }
}
