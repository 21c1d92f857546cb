use regex::Regex;

#[derive(Debug, PartialEq, Eq)]
pub enum PolicyError {
    TooShort,
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
    MissingSpecialCharacter,
}

impl PolicyError {
    pub fn message(&self) -> &'static str {
        match self {
            PolicyError::TooShort => "Password must be at least 8 characters long.",
            PolicyError::MissingUppercase => {
                "Password must contain at least one uppercase letter."
            }
            PolicyError::MissingLowercase => {
                "Password must contain at least one lowercase letter."
            }
            PolicyError::MissingDigit => "Password must contain at least one number.",
            PolicyError::MissingSpecialCharacter => {
                "Password must contain at least one special character (@$!%*?&)."
            }
        }
    }
}

/// At least 8 characters, an uppercase letter, a lowercase letter, a digit
/// and one of `@$!%*?&`. Checks run in order; the first failure is reported.
pub fn validate_strength(password: &str) -> Result<(), PolicyError> {
    if password.len() < 8 {
        return Err(PolicyError::TooShort);
    }
    if !Regex::new(r"[A-Z]").expect("Invalid regex").is_match(password) {
        return Err(PolicyError::MissingUppercase);
    }
    if !Regex::new(r"[a-z]").expect("Invalid regex").is_match(password) {
        return Err(PolicyError::MissingLowercase);
    }
    if !Regex::new(r"\d").expect("Invalid regex").is_match(password) {
        return Err(PolicyError::MissingDigit);
    }
    if !Regex::new(r"[@$!%*?&]")
        .expect("Invalid regex")
        .is_match(password)
    {
        return Err(PolicyError::MissingSpecialCharacter);
    }
    Ok(())
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub fn hash(password: &str) -> Result<String, Error> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|err| {
        tracing::error!("Failed to hash password: {}", err);
        Error::UnexpectedError
    })
}

pub fn verify(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}
