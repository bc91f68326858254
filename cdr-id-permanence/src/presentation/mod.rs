//! HTTP integration for resource servers built on axum.
//!
//! An upstream authentication layer validates the bearer token and stores a
//! [`ClaimsPrincipal`] in the request extensions. The middleware installed by
//! [`with_claims_transformation`] decrypts its identifiers and exposes the
//! result to handlers as a [`ResolvedCustomer`] extractor.

pub mod claims;

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;

use crate::application_service::permanence_service::{IdentifierCipher, SaltResolver};

pub use claims::{
    Claim, ClaimsOutcome, ClaimsPrincipal, ClaimsTransformError, ClaimsTransformer,
    ResolvedCustomer,
};

const INVALID_TOKEN_CHALLENGE: &str = "Bearer error=\"invalid_token\"";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wrap every route of `router` with claims decryption.
pub fn with_claims_transformation<R, C, S>(
    router: Router<S>,
    transformer: Arc<ClaimsTransformer<R, C>>,
) -> Router<S>
where
    R: SaltResolver + Send + Sync + 'static,
    C: IdentifierCipher + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(
        transformer,
        decrypt_claims::<R, C>,
    ))
}

async fn decrypt_claims<R, C>(
    State(transformer): State<Arc<ClaimsTransformer<R, C>>>,
    mut request: Request,
    next: Next,
) -> Response
where
    R: SaltResolver + Send + Sync + 'static,
    C: IdentifierCipher + Send + Sync + 'static,
{
    let outcome = match request.extensions_mut().get_mut::<ClaimsPrincipal>() {
        Some(principal) => transformer.transform(principal),
        None => Ok(ClaimsOutcome::Anonymous),
    };

    match outcome {
        Ok(ClaimsOutcome::Resolved(customer)) => {
            request.extensions_mut().insert(customer);
        }
        Ok(ClaimsOutcome::Anonymous) => {}
        Err(e) if e.status_code() == StatusCode::UNAUTHORIZED => return invalid_token(),
        Err(e) => {
            tracing::error!(error = %e, "claims transformation misconfigured");
            return server_error();
        }
    }

    next.run(request).await
}

/// `401` with an RFC 6750 challenge. Never says why the token was rejected.
pub fn invalid_token() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, INVALID_TOKEN_CHALLENGE)],
        Json(ErrorResponse {
            error: "invalid_token".to_string(),
        }),
    )
        .into_response()
}

pub fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "server_error".to_string(),
        }),
    )
        .into_response()
}

impl<S> FromRequestParts<S> for ResolvedCustomer
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ResolvedCustomer>()
            .cloned()
            .ok_or_else(invalid_token)
    }
}
