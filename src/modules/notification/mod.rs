use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::types::AppEnvironment;

#[derive(Debug)]
pub enum Error {
    NotSent,
}

type Result<T> = std::result::Result<T, Error>;

pub type DynMailer = Arc<dyn Mailer + Send + Sync>;

#[async_trait]
pub trait Mailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

pub struct SmtpMailer {
    host: String,
    sender: String,
    user: String,
    password: String,
    environment: AppEnvironment,
}

impl SmtpMailer {
    pub fn new(
        host: String,
        sender: String,
        user: String,
        password: String,
        environment: AppEnvironment,
    ) -> Self {
        Self {
            host,
            sender,
            user,
            password,
            environment,
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        if let AppEnvironment::Development = self.environment {
            // Console delivery in development, like the local mail backend
            // the server ran with before SMTP was configured.
            tracing::info!("mail to {}: {}\n{}", to, subject, body);
            return Ok(());
        }

        let email = Message::builder()
            .from(self.sender.parse().map_err(|err| {
                tracing::error!("Invalid mail sender address: {}", err);
                Error::NotSent
            })?)
            .to(to.parse().map_err(|err| {
                tracing::error!("Invalid mail recipient address: {}", err);
                Error::NotSent
            })?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|err| {
                tracing::error!("Failed to build email: {}", err);
                Error::NotSent
            })?;

        let transport: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
                .map_err(|err| {
                    tracing::error!("Failed to build SMTP transport: {}", err);
                    Error::NotSent
                })?
                .credentials(Credentials::new(self.user.clone(), self.password.clone()))
                .build();

        transport.send(email).await.map(|_| ()).map_err(|err| {
            tracing::error!("Failed to send email: {:?}", err);
            Error::NotSent
        })
    }
}

pub mod messages {
    /// The password reset mail, with the 1 hour validity the user is told.
    pub fn password_reset(username: &str, reset_link: &str) -> (String, String) {
        let subject = "Reset Your Meal Mate Password".to_string();
        let body = format!(
            "Hello {},\n\n\
             You requested to reset your password for Meal Mate.\n\n\
             Click the link below to reset your password:\n{}\n\n\
             This link will expire in 1 hour.\n\n\
             If you didn't request this, please ignore this email.\n\n\
             Best regards,\nMeal Mate Team",
            username, reset_link
        );
        (subject, body)
    }

    pub fn login_otp(username: &str, code: &str) -> (String, String) {
        let subject = "Your Meal Mate Login OTP".to_string();
        let body = format!(
            "Hello {},\n\n\
             Your one-time login code is: {}\n\n\
             It expires in 10 minutes and can be used once.\n\n\
             If you didn't request this, please ignore this email.\n\n\
             Best regards,\nMeal Mate Team",
            username, code
        );
        (subject, body)
    }
}

#[cfg(test)]
pub mod recording {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Debug, Clone)]
    pub struct SentMail {
        pub to: String,
        pub subject: String,
        pub body: String,
    }

    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<SentMail>>,
        pub fail: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(Error::NotSent);
            }
            self.sent.lock().await.push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
            Ok(())
        }
    }
}
