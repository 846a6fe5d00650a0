//! Admin token service
//!
//! Only requests carrying the admin token in the Authorization header reach the management API

use std::sync::Arc;

use axum::Extension;
use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use subtle::ConstantTimeEq;

use crate::api::Error;

/// The configured admin token
#[derive(Clone)]
pub struct AdminToken {
    /// The token itself
    token: Arc<str>,
}

impl AdminToken {
    /// Wrap the configured token
    pub fn new(token: &str) -> Self {
        Self {
            token: Arc::from(token),
        }
    }

    /// Does the given token match, compared in constant time?
    fn matches(&self, token: &str) -> bool {
        let expected = self.token.as_bytes();
        let given = token.as_bytes();

        expected.len() == given.len() && expected.ct_eq(given).into()
    }
}

/// Proof that the request was made by an admin
pub struct Admin;

impl<B> FromRequestParts<B> for Admin
where
    B: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &B) -> Result<Self, Self::Rejection> {
        // Extract the token from the authorization header
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| Error::forbidden("Missing API token"))?;

        let Extension(admin_token) = parts
            .extract::<Extension<AdminToken>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get admin token"))?;

        if admin_token.matches(bearer.token()) {
            Ok(Admin)
        } else {
            Err(Error::forbidden("Invalid API token"))
        }
    }
}
