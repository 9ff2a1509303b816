use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

/// A lower-cased, syntactically valid email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailObject(String);

impl EmailObject {
    pub fn parse(s: String) -> Result<EmailObject, String> {
        let normalized = s.trim().to_lowercase();
        if normalized.validate_email() {
            Ok(Self(normalized))
        } else {
            Err(format!("{} is not a valid email.", s))
        }
    }
}

impl TryFrom<String> for EmailObject {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EmailObject> for String {
    fn from(value: EmailObject) -> Self {
        value.0
    }
}

impl AsRef<str> for EmailObject {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::domain::EmailObject;

    #[derive(Debug, Clone)]
    struct ValidEmailFixture(pub String);

    impl Arbitrary for ValidEmailFixture {
        fn arbitrary(g: &mut Gen) -> Self {
            let mut rng = StdRng::seed_from_u64(u64::arbitrary(g));
            let email = SafeEmail().fake_with_rng(&mut rng);
            Self(email)
        }
    }

    #[quickcheck]
    fn valid_emails_are_parsed_successfully(valid_email: ValidEmailFixture) -> bool {
        EmailObject::parse(valid_email.0).is_ok()
    }

    #[test]
    fn email_is_normalized_to_lower_case() {
        let email = EmailObject::parse(" Jane.Doe@Example.COM ".to_string()).unwrap();
        assert_eq!(email.as_ref(), "jane.doe@example.com");
    }

    #[test]
    fn email_missing_at_symbol_is_rejected() {
        assert!(EmailObject::parse("janedoe.example.com".to_string()).is_err());
        assert!(EmailObject::parse("".to_string()).is_err());
    }
}
