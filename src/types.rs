use async_trait::async_trait;
use std::env;
use std::sync::Arc;

use crate::{
    modules::{
        auth::repository::{DynOtpStore, DynSessionStore, PgOtpStore, PgSessionStore},
        cart::repository::{DynCartStore, PgCartStore},
        catalog::repository::{DynCatalogStore, PgCatalogStore},
        notification::{DynMailer, SmtpMailer},
        order::repository::{DynOrderStore, PgOrderStore},
        payment::{DynPaymentGateway, RazorpayGateway},
        user::repository::{DynCustomerStore, PgCustomerStore},
    },
    utils::database,
};

#[derive(Clone)]
pub enum AppEnvironment {
    Production,
    Development,
}

impl AppEnvironment {
    pub fn from(raw_environment: String) -> Self {
        match raw_environment.as_ref() {
            "production" => Self::Production,
            _ => Self::Development,
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone)]
pub struct AuthContext {
    pub secret_key: String,
    pub admin_access_code: String,
}

#[derive(Clone)]
pub struct PaymentContext {
    pub gateway: DynPaymentGateway,
    pub key_id: String,
    pub currency: String,
}

#[derive(Clone)]
pub struct Context {
    pub app: AppContext,
    pub auth: AuthContext,
    pub payment: PaymentContext,
    pub mailer: DynMailer,
    pub customers: DynCustomerStore,
    pub catalog: DynCatalogStore,
    pub carts: DynCartStore,
    pub orders: DynOrderStore,
    pub sessions: DynSessionStore,
    pub otps: DynOtpStore,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub admin_access_code: String,
}

#[derive(Clone)]
pub struct PaymentConfig {
    pub api_endpoint: String,
    pub key_id: String,
    pub key_secret: String,
    pub currency: String,
}

#[derive(Clone)]
pub struct MailConfig {
    pub host: String,
    pub sender: String,
    pub user: String,
    pub password: String,
}

#[derive(Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub app: AppConfig,
    pub auth: AuthConfig,
    pub payment: PaymentConfig,
    pub mail: MailConfig,
}

impl Default for Config {
    fn default() -> Self {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u32>()
            .expect("Invalid PORT number");
        let url = env::var("URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));
        let secret_key = env::var("SECRET_KEY").expect("SECRET_KEY not set");
        let admin_access_code = env::var("ADMIN_ACCESS_CODE").expect("ADMIN_ACCESS_CODE not set");
        let payment_api_endpoint = env::var("RAZORPAY_API_ENDPOINT")
            .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string());
        let payment_key_id = env::var("RAZORPAY_KEY_ID").expect("RAZORPAY_KEY_ID not set");
        let payment_key_secret =
            env::var("RAZORPAY_KEY_SECRET").expect("RAZORPAY_KEY_SECRET not set");
        let payment_currency = env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "INR".to_string());
        let mail_host = env::var("SMTP_HOST").unwrap_or_default();
        let mail_sender = env::var("MAIL_SENDER").unwrap_or_default();
        let mail_user = env::var("SMTP_USER").unwrap_or_default();
        let mail_password = env::var("SMTP_PASSWORD").unwrap_or_default();

        Self {
            database: DatabaseConfig { url: database_url },
            app: AppConfig {
                host,
                environment: AppEnvironment::from(environment),
                port,
                url,
            },
            auth: AuthConfig {
                secret_key,
                admin_access_code,
            },
            payment: PaymentConfig {
                api_endpoint: payment_api_endpoint,
                key_id: payment_key_id,
                key_secret: payment_key_secret,
                currency: payment_currency,
            },
            mail: MailConfig {
                host: mail_host,
                sender: mail_sender,
                user: mail_user,
                password: mail_password,
            },
        }
    }
}

#[async_trait]
pub trait ToContext {
    async fn to_context(self) -> Context;
}

#[async_trait]
impl ToContext for Config {
    async fn to_context(self) -> Context {
        let pool = database::connect(self.database.url.as_str()).await;

        let mailer = Arc::new(SmtpMailer::new(
            self.mail.host,
            self.mail.sender,
            self.mail.user,
            self.mail.password,
            self.app.environment.clone(),
        ));

        let gateway = Arc::new(RazorpayGateway::new(
            self.payment.api_endpoint,
            self.payment.key_id.clone(),
            self.payment.key_secret,
        ));

        Context {
            app: AppContext {
                host: self.app.host,
                environment: self.app.environment,
                port: self.app.port,
                url: self.app.url,
            },
            auth: AuthContext {
                secret_key: self.auth.secret_key,
                admin_access_code: self.auth.admin_access_code,
            },
            payment: PaymentContext {
                gateway,
                key_id: self.payment.key_id,
                currency: self.payment.currency,
            },
            mailer,
            customers: Arc::new(PgCustomerStore::new(pool.clone())),
            catalog: Arc::new(PgCatalogStore::new(pool.clone())),
            carts: Arc::new(PgCartStore::new(pool.clone())),
            orders: Arc::new(PgOrderStore::new(pool.clone())),
            sessions: Arc::new(PgSessionStore::new(pool.clone())),
            otps: Arc::new(PgOtpStore::new(pool)),
        }
    }
}
