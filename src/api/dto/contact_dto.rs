//! DTOs for the contact-form relay.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /auth/contact-form`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormRequest {
    /// Sender's name.
    pub name: String,
    /// Sender's reply address.
    pub email: String,
    /// Company name, if any.
    pub company_name: Option<String>,
    /// Company website.
    pub website: Option<String>,
    /// What the sender wants to achieve with the product.
    pub goals: Option<String>,
}

/// Acknowledgement returned once validation passes. Delivery happens
/// after the response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ContactFormResponse {
    /// Always `"ok"`.
    pub status: String,
}
