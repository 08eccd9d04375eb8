use serde::Deserialize;

use crate::{auth::services::is_valid_email, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct PartnerQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePartnerRequest {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub logo_url: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePartnerRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub logo_url: Option<String>,
    pub services: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

fn check_email(email: Option<&str>) -> Result<(), ApiError> {
    match email.map(str::trim) {
        Some(e) if !e.is_empty() && !is_valid_email(e) => {
            Err(ApiError::bad_request("Partner email is invalid"))
        }
        _ => Ok(()),
    }
}

impl CreatePartnerRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() || self.category.trim().is_empty() {
            return Err(ApiError::bad_request("Name and category are required"));
        }
        check_email(self.email.as_deref())
    }
}

impl UpdatePartnerRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if matches!(self.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(ApiError::bad_request("Name cannot be blank"));
        }
        if matches!(self.category.as_deref(), Some(c) if c.trim().is_empty()) {
            return Err(ApiError::bad_request("Category cannot be blank"));
        }
        check_email(self.email.as_deref())
    }
}
