use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct AddPaymentMethodRequest {
    pub card_number: String,
    pub exp_month: u8,
    pub exp_year: u16,
    pub holder_name: String,
    #[serde(default)]
    pub make_default: bool,
}
