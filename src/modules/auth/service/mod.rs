pub mod account;
pub mod auth;
pub mod otp;
pub mod password;
pub mod reset;
