use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use tracing::debug;

use super::AuthenticatedUser;
use crate::error::{AppError, AuthError};
use crate::AppState;

/// Handlers that take an `AuthenticatedUser` argument reject requests without
/// a valid `Authorization: Bearer <token>` header before they run.
impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::InternalError("application state is not registered".into()))?;

    let Some(token) = bearer_token(req) else {
        debug!("Request to {} without bearer token", req.path());
        return Err(AuthError::InvalidToken.into());
    };

    state.auth_service.validate_token(token)
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
