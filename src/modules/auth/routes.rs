use super::{
    repository::Session,
    service::{self, account},
};
use crate::{types::Context, utils::validation};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

fn session_json(session: &Session) -> Value {
    json!({
        "access_token": session.access_token,
        "refresh_token": session.refresh_token,
    })
}

fn account_error(err: account::Error) -> (StatusCode, Json<Value>) {
    let status = match err {
        account::Error::WeakPassword(_)
        | account::Error::PasswordMismatch
        | account::Error::InvalidAccessCode
        | account::Error::NoEmail
        | account::Error::InvalidResetLink => StatusCode::BAD_REQUEST,
        account::Error::UsernameTaken
        | account::Error::EmailTaken
        | account::Error::MobileTaken => StatusCode::CONFLICT,
        account::Error::InvalidCredentials | account::Error::InvalidAdminCredentials => {
            StatusCode::UNAUTHORIZED
        }
        account::Error::AdminLoginRequired | account::Error::AdminOnly => StatusCode::FORBIDDEN,
        account::Error::MailFailed => StatusCode::BAD_GATEWAY,
        account::Error::UnexpectedError => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.message() })))
}

#[derive(Deserialize, Validate)]
struct SignUpBody {
    #[validate(length(min = 1, message = "Username is required"))]
    username: String,
    password: String,
    #[validate(email(message = "Invalid email address"))]
    email: String,
    #[validate(length(equal = 10, message = "Mobile number must be 10 digits"))]
    mobile: String,
    #[validate(length(min = 1, message = "Address is required"))]
    address: String,
}

async fn sign_up(
    State(ctx): State<Arc<Context>>,
    Json(body): Json<SignUpBody>,
) -> impl IntoResponse {
    if let Err(errors) = body.validate() {
        return validation::into_response(errors);
    }

    match account::sign_up(
        ctx,
        account::SignUpPayload {
            username: body.username,
            password: body.password,
            email: body.email,
            mobile: body.mobile,
            address: body.address,
        },
    )
    .await
    {
        Ok(_) => (
            StatusCode::CREATED,
            Json(json!({ "message": "Account created successfully! Please sign in." })),
        ),
        Err(err) => account_error(err),
    }
}

#[derive(Deserialize)]
struct SignInBody {
    mobile: String,
    password: String,
}

async fn sign_in(
    State(ctx): State<Arc<Context>>,
    Json(body): Json<SignInBody>,
) -> impl IntoResponse {
    match account::sign_in(ctx, &body.mobile, &body.password).await {
        Ok((customer, session)) => (
            StatusCode::OK,
            Json(json!({
                "customer": customer,
                "tokens": session_json(&session),
            })),
        ),
        Err(err) => account_error(err),
    }
}

#[derive(Deserialize, Validate)]
struct AdminSignUpBody {
    #[validate(length(min = 1, message = "Username is required"))]
    username: String,
    password: String,
    confirm_password: String,
    #[validate(email(message = "Invalid email address"))]
    email: String,
    admin_code: String,
}

async fn admin_sign_up(
    State(ctx): State<Arc<Context>>,
    Json(body): Json<AdminSignUpBody>,
) -> impl IntoResponse {
    if let Err(errors) = body.validate() {
        return validation::into_response(errors);
    }

    match account::admin_sign_up(
        ctx,
        account::AdminSignUpPayload {
            username: body.username,
            password: body.password,
            confirm_password: body.confirm_password,
            email: body.email,
            admin_code: body.admin_code,
        },
    )
    .await
    {
        Ok(_) => (
            StatusCode::CREATED,
            Json(json!({ "message": "Admin account created successfully! Please sign in." })),
        ),
        Err(err) => account_error(err),
    }
}

#[derive(Deserialize)]
struct AdminSignInBody {
    username: String,
    password: String,
}

async fn admin_sign_in(
    State(ctx): State<Arc<Context>>,
    Json(body): Json<AdminSignInBody>,
) -> impl IntoResponse {
    match account::admin_sign_in(ctx, &body.username, &body.password).await {
        Ok((customer, session)) => (
            StatusCode::OK,
            Json(json!({
                "customer": customer,
                "tokens": session_json(&session),
            })),
        ),
        Err(err) => account_error(err),
    }
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh_token: String,
}

async fn refresh(
    State(ctx): State<Arc<Context>>,
    Json(body): Json<RefreshBody>,
) -> impl IntoResponse {
    match service::auth::refresh_session(ctx, &body.refresh_token).await {
        Ok(session) => (StatusCode::OK, Json(json!({ "tokens": session_json(&session) }))),
        Err(service::auth::Error::UnexpectedError) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to refresh session" })),
        ),
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid session token" })),
        ),
    }
}

#[derive(Deserialize, Validate)]
struct RequestOtpBody {
    #[validate(length(equal = 10, message = "Mobile number must be 10 digits"))]
    mobile: String,
}

async fn request_otp(
    State(ctx): State<Arc<Context>>,
    Json(body): Json<RequestOtpBody>,
) -> impl IntoResponse {
    if let Err(errors) = body.validate() {
        return validation::into_response(errors);
    }

    match service::otp::request(ctx, &body.mobile).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "message": "If an account exists with that mobile number, a login code has been sent."
            })),
        ),
        Err(service::otp::Error::NotSent) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": "Failed to send login code. Please try again." })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to send login code. Please try again." })),
        ),
    }
}

#[derive(Deserialize)]
struct VerifyOtpBody {
    mobile: String,
    code: String,
}

async fn verify_otp(
    State(ctx): State<Arc<Context>>,
    Json(body): Json<VerifyOtpBody>,
) -> impl IntoResponse {
    match service::otp::verify(ctx, &body.mobile, &body.code).await {
        Ok(session) => (StatusCode::OK, Json(json!({ "tokens": session_json(&session) }))),
        Err(service::otp::Error::InvalidOtp) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid or expired OTP." })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to verify login code" })),
        ),
    }
}

#[derive(Deserialize)]
struct ForgotPasswordBody {
    identifier: String,
}

async fn forgot_password(
    State(ctx): State<Arc<Context>>,
    Json(body): Json<ForgotPasswordBody>,
) -> impl IntoResponse {
    match account::forgot_password(ctx, &body.identifier).await {
        Ok(message) => (StatusCode::OK, Json(json!({ "message": message }))),
        Err(err) => account_error(err),
    }
}

async fn validate_reset_link(
    State(ctx): State<Arc<Context>>,
    Path((uid, token)): Path<(String, String)>,
) -> impl IntoResponse {
    match account::validate_reset_link(ctx, &uid, &token).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "valid": true }))),
        Err(err) => account_error(err),
    }
}

#[derive(Deserialize)]
struct ResetPasswordBody {
    password: String,
    confirm_password: String,
}

async fn reset_password(
    State(ctx): State<Arc<Context>>,
    Path((uid, token)): Path<(String, String)>,
    Json(body): Json<ResetPasswordBody>,
) -> impl IntoResponse {
    match account::reset_password(ctx, &uid, &token, &body.password, &body.confirm_password).await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "message": "Password reset successful! Please sign in with your new password."
            })),
        ),
        Err(err) => account_error(err),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/admin/sign-up", post(admin_sign_up))
        .route("/admin/sign-in", post(admin_sign_in))
        .route("/refresh", post(refresh))
        .route("/otp/request", post(request_otp))
        .route("/otp/verify", post(verify_otp))
        .route("/forgot-password", post(forgot_password))
        .route(
            "/reset-password/:uid/:token",
            get(validate_reset_link).post(reset_password),
        )
}
