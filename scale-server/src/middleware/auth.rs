use scale_common::token::auth_token::AuthToken;
use scale_common::token::TokenError;

use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures::future::{self, LocalBoxFuture};
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::handlers::error::HttpErrorResponse;

/// The authenticated caller of a request that passed through an `AuthGate`. Handlers
/// take this as an argument rather than reading the auth cookie themselves.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Identity(..)")
    }
}

// Only this module can construct the extension, so nothing else can plant an identity
// in a request.
struct VerifiedIdentity(Identity);

impl FromRequest for Identity {
    type Error = HttpErrorResponse;
    type Future = future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<VerifiedIdentity>() {
            Some(verified) => future::ok(verified.0.clone()),
            None => future::err(HttpErrorResponse::Unauthenticated),
        }
    }
}

/// Rejects any request that lacks a valid auth token cookie with a 401 before the wrapped
/// service runs. Why a token was rejected is never revealed.
#[derive(Clone)]
pub struct AuthGate {
    cookie_name: Arc<str>,
    signing_key: Arc<Zeroizing<Vec<u8>>>,
}

impl AuthGate {
    pub fn new(cookie_name: &str, signing_key: &[u8]) -> Self {
        AuthGate {
            cookie_name: Arc::from(cookie_name),
            signing_key: Arc::new(Zeroizing::new(Vec::from(signing_key))),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = AuthGateMiddleware<S>;
    type Future = future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        future::ok(AuthGateMiddleware {
            service,
            cookie_name: Arc::clone(&self.cookie_name),
            signing_key: Arc::clone(&self.signing_key),
        })
    }
}

pub struct AuthGateMiddleware<S> {
    service: S,
    cookie_name: Arc<str>,
    signing_key: Arc<Zeroizing<Vec<u8>>>,
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match verify_auth_cookie(&req, &self.cookie_name, &self.signing_key) {
            Ok(identity) => {
                req.extensions_mut().insert(VerifiedIdentity(identity));
                Box::pin(self.service.call(req))
            }
            Err(e) => Box::pin(future::err::<ServiceResponse<B>, actix_web::Error>(e.into())),
        }
    }
}

fn verify_auth_cookie(
    req: &ServiceRequest,
    cookie_name: &str,
    signing_key: &[u8],
) -> Result<Identity, HttpErrorResponse> {
    let cookie = req.cookie(cookie_name).ok_or(TokenError::TokenMissing)?;
    let issuer = AuthToken::verify_issuer(cookie.value(), signing_key)?;

    Ok(Identity(issuer))
}
