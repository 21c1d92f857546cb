use std::sync::Arc;

use crate::{
    modules::{
        auth::{
            repository::Session,
            service::{self, password, password::PolicyError, reset},
        },
        notification::messages,
        user::repository::{CreateCustomerPayload, Customer},
    },
    types::Context,
};

type Result<T> = std::result::Result<T, Error>;

/// Sent whether or not the identifier matched an account, so the endpoint
/// can not be used to probe which accounts exist.
pub const GENERIC_RESET_MESSAGE: &str =
    "If an account exists with that information, a password reset link has been sent.";

#[derive(Debug, PartialEq)]
pub enum Error {
    WeakPassword(PolicyError),
    PasswordMismatch,
    UsernameTaken,
    EmailTaken,
    MobileTaken,
    InvalidAccessCode,
    InvalidCredentials,
    InvalidAdminCredentials,
    AdminLoginRequired,
    AdminOnly,
    NoEmail,
    MailFailed,
    InvalidResetLink,
    UnexpectedError,
}

impl Error {
    pub fn message(&self) -> &'static str {
        match self {
            Error::WeakPassword(policy) => policy.message(),
            Error::PasswordMismatch => "Passwords do not match.",
            Error::UsernameTaken => {
                "Username already exists. Please choose a different username."
            }
            Error::EmailTaken => "Email already registered. Please use a different email.",
            Error::MobileTaken => {
                "Phone number already registered. Please use a different number."
            }
            Error::InvalidAccessCode => {
                "Invalid admin access code. Contact system administrator."
            }
            Error::InvalidCredentials => "Invalid phone number or password.",
            Error::InvalidAdminCredentials => "Invalid admin username or password.",
            Error::AdminLoginRequired => "Please use admin login for admin accounts.",
            Error::AdminOnly => "Access denied. Admin credentials required.",
            Error::NoEmail => "No email associated with this account. Please contact support.",
            Error::MailFailed => "Failed to send reset email. Please try again.",
            Error::InvalidResetLink => "Password reset link is invalid or has expired.",
            Error::UnexpectedError => "An unexpected error occurred",
        }
    }
}

pub struct SignUpPayload {
    pub username: String,
    pub password: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
}

pub struct AdminSignUpPayload {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub email: String,
    pub admin_code: String,
}

async fn ensure_username_free(ctx: &Arc<Context>, username: &str) -> Result<()> {
    match ctx.customers.find_by_username(username).await {
        Ok(Some(_)) => Err(Error::UsernameTaken),
        Ok(None) => Ok(()),
        Err(_) => Err(Error::UnexpectedError),
    }
}

async fn ensure_email_free(ctx: &Arc<Context>, email: &str) -> Result<()> {
    match ctx.customers.find_by_email(email).await {
        Ok(Some(_)) => Err(Error::EmailTaken),
        Ok(None) => Ok(()),
        Err(_) => Err(Error::UnexpectedError),
    }
}

pub async fn sign_up(ctx: Arc<Context>, payload: SignUpPayload) -> Result<Customer> {
    password::validate_strength(&payload.password).map_err(Error::WeakPassword)?;

    ensure_username_free(&ctx, &payload.username).await?;
    ensure_email_free(&ctx, &payload.email).await?;
    match ctx.customers.find_by_mobile(&payload.mobile).await {
        Ok(Some(_)) => return Err(Error::MobileTaken),
        Ok(None) => (),
        Err(_) => return Err(Error::UnexpectedError),
    }

    let password_hash = password::hash(&payload.password).map_err(|_| Error::UnexpectedError)?;
    ctx.customers
        .create(CreateCustomerPayload {
            username: payload.username,
            password_hash,
            email: payload.email,
            mobile: Some(payload.mobile),
            address: payload.address,
            is_staff: false,
            is_superuser: false,
        })
        .await
        .map_err(|_| Error::UnexpectedError)
}

/// Admin accounts share the customer table but carry the staff flag and no
/// mobile or address. Registration is gated by the configured access code.
pub async fn admin_sign_up(ctx: Arc<Context>, payload: AdminSignUpPayload) -> Result<Customer> {
    if payload.admin_code != ctx.auth.admin_access_code {
        return Err(Error::InvalidAccessCode);
    }
    if payload.password != payload.confirm_password {
        return Err(Error::PasswordMismatch);
    }
    password::validate_strength(&payload.password).map_err(Error::WeakPassword)?;

    ensure_username_free(&ctx, &payload.username).await?;
    ensure_email_free(&ctx, &payload.email).await?;

    let password_hash = password::hash(&payload.password).map_err(|_| Error::UnexpectedError)?;
    ctx.customers
        .create(CreateCustomerPayload {
            username: payload.username,
            password_hash,
            email: payload.email,
            mobile: None,
            address: String::new(),
            is_staff: true,
            is_superuser: false,
        })
        .await
        .map_err(|_| Error::UnexpectedError)
}

/// Customer login is by mobile number. Staff accounts are turned away and
/// pointed at the admin login instead.
pub async fn sign_in(
    ctx: Arc<Context>,
    mobile: &str,
    password: &str,
) -> Result<(Customer, Session)> {
    let customer = ctx
        .customers
        .find_by_mobile(mobile)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::InvalidCredentials)?;

    if !password::verify(password, &customer.password_hash) {
        return Err(Error::InvalidCredentials);
    }
    if customer.is_staff || customer.is_superuser {
        return Err(Error::AdminLoginRequired);
    }

    let session = service::auth::create_session(ctx, customer.id.clone())
        .await
        .map_err(|_| Error::UnexpectedError)?;
    Ok((customer, session))
}

pub async fn admin_sign_in(
    ctx: Arc<Context>,
    username: &str,
    password: &str,
) -> Result<(Customer, Session)> {
    let customer = ctx
        .customers
        .find_by_username(username)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::InvalidAdminCredentials)?;

    if !password::verify(password, &customer.password_hash) {
        return Err(Error::InvalidAdminCredentials);
    }
    if !customer.is_staff && !customer.is_superuser {
        return Err(Error::AdminOnly);
    }

    let session = service::auth::create_session(ctx, customer.id.clone())
        .await
        .map_err(|_| Error::UnexpectedError)?;
    Ok((customer, session))
}

/// The identifier may be an email, a 10-digit mobile number or a username.
pub async fn forgot_password(ctx: Arc<Context>, identifier: &str) -> Result<&'static str> {
    let lookup = if identifier.contains('@') {
        ctx.customers.find_by_email(identifier).await
    } else if identifier.len() == 10 && identifier.chars().all(|c| c.is_ascii_digit()) {
        ctx.customers.find_by_mobile(identifier).await
    } else {
        ctx.customers.find_by_username(identifier).await
    };

    let Some(customer) = lookup.map_err(|_| Error::UnexpectedError)? else {
        return Ok(GENERIC_RESET_MESSAGE);
    };

    if customer.email.is_empty() {
        return Err(Error::NoEmail);
    }

    let token = reset::make_token(&ctx.auth.secret_key, &customer);
    let uid = reset::encode_uid(&customer.id);
    let reset_link = format!("{}/reset-password/{}/{}", ctx.app.url, uid, token);

    let (subject, body) = messages::password_reset(&customer.username, &reset_link);
    ctx.mailer
        .send(&customer.email, &subject, &body)
        .await
        .map_err(|_| Error::MailFailed)?;

    Ok(GENERIC_RESET_MESSAGE)
}

pub async fn validate_reset_link(ctx: Arc<Context>, uid: &str, token: &str) -> Result<Customer> {
    let customer_id = reset::decode_uid(uid).ok_or(Error::InvalidResetLink)?;
    let customer = ctx
        .customers
        .find_by_id(&customer_id)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::InvalidResetLink)?;

    if !reset::check_token(&ctx.auth.secret_key, &customer, token) {
        return Err(Error::InvalidResetLink);
    }
    Ok(customer)
}

pub async fn reset_password(
    ctx: Arc<Context>,
    uid: &str,
    token: &str,
    password: &str,
    confirm_password: &str,
) -> Result<()> {
    let customer = validate_reset_link(ctx.clone(), uid, token).await?;

    if password != confirm_password {
        return Err(Error::PasswordMismatch);
    }
    password::validate_strength(password).map_err(Error::WeakPassword)?;

    let password_hash = password::hash(password).map_err(|_| Error::UnexpectedError)?;
    ctx.customers
        .update_password_hash(&customer.id, &password_hash)
        .await
        .map_err(|_| Error::UnexpectedError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::test_context;

    fn alice_payload() -> SignUpPayload {
        SignUpPayload {
            username: "alice".to_string(),
            password: "Abc123!@".to_string(),
            email: "alice@example.com".to_string(),
            mobile: "9876543210".to_string(),
            address: "1 Main St".to_string(),
        }
    }

    #[tokio::test]
    async fn sign_up_hashes_the_password() {
        let (ctx, _handles) = test_context();
        let alice = sign_up(ctx, alice_payload()).await.unwrap();
        assert!(!alice.is_staff);
        assert_ne!(alice.password_hash, "Abc123!@");
        assert!(password::verify("Abc123!@", &alice.password_hash));
    }

    #[tokio::test]
    async fn duplicate_username_wins_over_duplicate_email() {
        let (ctx, _handles) = test_context();
        sign_up(ctx.clone(), alice_payload()).await.unwrap();

        // Same username and email; the username complaint comes first.
        let err = sign_up(
            ctx.clone(),
            SignUpPayload {
                mobile: "9999999999".to_string(),
                ..alice_payload()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err, Error::UsernameTaken);
        assert_eq!(
            err.message(),
            "Username already exists. Please choose a different username."
        );

        let err = sign_up(
            ctx.clone(),
            SignUpPayload {
                username: "bob".to_string(),
                mobile: "9999999999".to_string(),
                ..alice_payload()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err, Error::EmailTaken);

        // No partial record was created for the rejected attempts.
        assert!(ctx.customers.find_by_username("bob").await.unwrap().is_none());
        assert!(ctx
            .customers
            .find_by_mobile("9999999999")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn weak_password_is_rejected_before_any_lookup() {
        let (ctx, _handles) = test_context();
        let err = sign_up(
            ctx,
            SignUpPayload {
                password: "abc12345".to_string(),
                ..alice_payload()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err, Error::WeakPassword(PolicyError::MissingUppercase));
        assert_eq!(
            err.message(),
            "Password must contain at least one uppercase letter."
        );
    }

    #[tokio::test]
    async fn customer_login_turns_staff_away() {
        let (ctx, _handles) = test_context();
        sign_up(ctx.clone(), alice_payload()).await.unwrap();

        assert_eq!(
            sign_in(ctx.clone(), "9876543210", "wrong-password")
                .await
                .unwrap_err(),
            Error::InvalidCredentials
        );
        assert_eq!(
            sign_in(ctx.clone(), "0000000000", "Abc123!@")
                .await
                .unwrap_err(),
            Error::InvalidCredentials
        );

        let (customer, session) = sign_in(ctx.clone(), "9876543210", "Abc123!@").await.unwrap();
        assert_eq!(customer.username, "alice");
        assert_eq!(session.customer_id, customer.id);

        // A staff account with a mobile still cannot use the customer login.
        ctx.customers
            .create(CreateCustomerPayload {
                username: "manager".to_string(),
                password_hash: password::hash("Abc123!@").unwrap(),
                email: "manager@example.com".to_string(),
                mobile: Some("9123456789".to_string()),
                address: String::new(),
                is_staff: true,
                is_superuser: false,
            })
            .await
            .unwrap();
        let err = sign_in(ctx, "9123456789", "Abc123!@").await.unwrap_err();
        assert_eq!(err, Error::AdminLoginRequired);
        assert_eq!(err.message(), "Please use admin login for admin accounts.");
    }

    #[tokio::test]
    async fn admin_sign_up_is_gated_by_the_access_code() {
        let (ctx, _handles) = test_context();

        let payload = AdminSignUpPayload {
            username: "root".to_string(),
            password: "Abc123!@".to_string(),
            confirm_password: "Abc123!@".to_string(),
            email: "root@example.com".to_string(),
            admin_code: "wrong-code".to_string(),
        };
        assert_eq!(
            admin_sign_up(ctx.clone(), payload).await.unwrap_err(),
            Error::InvalidAccessCode
        );

        let payload = AdminSignUpPayload {
            username: "root".to_string(),
            password: "Abc123!@".to_string(),
            confirm_password: "Abc123!?".to_string(),
            email: "root@example.com".to_string(),
            admin_code: ctx.auth.admin_access_code.clone(),
        };
        assert_eq!(
            admin_sign_up(ctx.clone(), payload).await.unwrap_err(),
            Error::PasswordMismatch
        );

        let payload = AdminSignUpPayload {
            username: "root".to_string(),
            password: "Abc123!@".to_string(),
            confirm_password: "Abc123!@".to_string(),
            email: "root@example.com".to_string(),
            admin_code: ctx.auth.admin_access_code.clone(),
        };
        let admin = admin_sign_up(ctx.clone(), payload).await.unwrap();
        assert!(admin.is_staff);
        assert!(admin.mobile.is_none());

        let (resolved, _session) = admin_sign_in(ctx.clone(), "root", "Abc123!@").await.unwrap();
        assert_eq!(resolved.id, admin.id);
    }

    #[tokio::test]
    async fn admin_login_refuses_plain_customers() {
        let (ctx, _handles) = test_context();
        sign_up(ctx.clone(), alice_payload()).await.unwrap();

        assert_eq!(
            admin_sign_in(ctx.clone(), "alice", "Abc123!@")
                .await
                .unwrap_err(),
            Error::AdminOnly
        );
        assert_eq!(
            admin_sign_in(ctx, "nobody", "Abc123!@").await.unwrap_err(),
            Error::InvalidAdminCredentials
        );
    }

    #[tokio::test]
    async fn forgot_password_answers_the_same_for_unknown_accounts() {
        let (ctx, handles) = test_context();
        sign_up(ctx.clone(), alice_payload()).await.unwrap();

        let known = forgot_password(ctx.clone(), "alice").await.unwrap();
        let unknown = forgot_password(ctx.clone(), "nobody").await.unwrap();
        assert_eq!(known, unknown);

        // Only the real account got a mail.
        assert_eq!(handles.mailer.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn forgot_password_surfaces_mail_transport_failure() {
        let (ctx, handles) = test_context();
        sign_up(ctx.clone(), alice_payload()).await.unwrap();

        handles
            .mailer
            .fail
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let err = forgot_password(ctx, "alice").await.unwrap_err();
        assert_eq!(err, Error::MailFailed);
        assert_eq!(err.message(), "Failed to send reset email. Please try again.");
    }

    #[tokio::test]
    async fn forgot_password_accepts_email_mobile_or_username() {
        let (ctx, handles) = test_context();
        sign_up(ctx.clone(), alice_payload()).await.unwrap();

        forgot_password(ctx.clone(), "alice@example.com").await.unwrap();
        forgot_password(ctx.clone(), "9876543210").await.unwrap();
        forgot_password(ctx.clone(), "alice").await.unwrap();

        let sent = handles.mailer.sent.lock().await;
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|m| m.to == "alice@example.com"));
        assert!(sent
            .iter()
            .all(|m| m.subject == "Reset Your Meal Mate Password"));
    }

    fn link_parts(body: &str) -> (String, String) {
        let link = body
            .lines()
            .find(|line| line.contains("/reset-password/"))
            .unwrap()
            .trim();
        let mut parts = link.rsplitn(3, '/');
        let token = parts.next().unwrap().to_string();
        let uid = parts.next().unwrap().to_string();
        (uid, token)
    }

    #[tokio::test]
    async fn mailed_link_resets_the_password_once() {
        let (ctx, handles) = test_context();
        sign_up(ctx.clone(), alice_payload()).await.unwrap();

        forgot_password(ctx.clone(), "alice").await.unwrap();
        let (uid, token) = {
            let sent = handles.mailer.sent.lock().await;
            link_parts(&sent[0].body)
        };

        let customer = validate_reset_link(ctx.clone(), &uid, &token).await.unwrap();
        assert_eq!(customer.username, "alice");

        reset_password(ctx.clone(), &uid, &token, "New456!@", "New456!@")
            .await
            .unwrap();

        let (_, _) = sign_in(ctx.clone(), "9876543210", "New456!@").await.unwrap();
        assert_eq!(
            sign_in(ctx.clone(), "9876543210", "Abc123!@")
                .await
                .unwrap_err(),
            Error::InvalidCredentials
        );

        // Changing the hash voids the link.
        assert_eq!(
            validate_reset_link(ctx, &uid, &token).await.unwrap_err(),
            Error::InvalidResetLink
        );
    }

    #[tokio::test]
    async fn reset_submission_enforces_confirmation_and_policy() {
        let (ctx, handles) = test_context();
        sign_up(ctx.clone(), alice_payload()).await.unwrap();

        forgot_password(ctx.clone(), "alice").await.unwrap();
        let (uid, token) = {
            let sent = handles.mailer.sent.lock().await;
            link_parts(&sent[0].body)
        };

        assert_eq!(
            reset_password(ctx.clone(), &uid, &token, "New456!@", "Other789!@")
                .await
                .unwrap_err(),
            Error::PasswordMismatch
        );
        assert_eq!(
            reset_password(ctx.clone(), &uid, &token, "weak", "weak")
                .await
                .unwrap_err(),
            Error::WeakPassword(PolicyError::TooShort)
        );
        assert_eq!(
            reset_password(ctx, "!!!", &token, "New456!@", "New456!@")
                .await
                .unwrap_err(),
            Error::InvalidResetLink
        );
    }
}
