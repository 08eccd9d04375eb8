use serde::Deserialize;

use crate::{auth::services::is_valid_email, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PartnerInquiryRequest {
    pub company: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

fn require(value: &str, what: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{what} is required")));
    }
    Ok(())
}

fn require_email(email: &str) -> Result<(), ApiError> {
    if !is_valid_email(email.trim()) {
        return Err(ApiError::bad_request("Valid email is required"));
    }
    Ok(())
}

impl ContactRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require(&self.name, "Name")?;
        require_email(&self.email)?;
        require(&self.message, "Message")
    }
}

impl PartnerInquiryRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require(&self.company, "Company")?;
        require(&self.name, "Name")?;
        require_email(&self.email)?;
        require(&self.message, "Message")
    }
}
