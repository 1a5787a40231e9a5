use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN,
};
use actix_web::http::Method;
use actix_web::{Error, HttpResponse, ResponseError};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;
use waypoints_common::WaypointError;

use crate::error::ApiError;

/// Header carrying the shared site token
pub const SITE_TOKEN_HEADER: &str = "X-Site-Token";

/// Paths reachable without a site token
pub const PUBLIC_PATHS: &[&str] = &["/health"];

/// Rejects requests whose `X-Site-Token` does not match the shared secret.
pub struct SiteToken {
    token: Arc<String>,
    public_paths: Arc<HashSet<String>>,
}

impl SiteToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(token.into()),
            public_paths: Arc::new(PUBLIC_PATHS.iter().map(|p| p.to_string()).collect()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SiteToken
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SiteTokenMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SiteTokenMiddleware {
            service,
            token: self.token.clone(),
            public_paths: self.public_paths.clone(),
        }))
    }
}

pub struct SiteTokenMiddleware<S> {
    service: S,
    token: Arc<String>,
    public_paths: Arc<HashSet<String>>,
}

impl<S> SiteTokenMiddleware<S> {
    fn is_authorized(&self, req: &ServiceRequest) -> bool {
        req.headers()
            .get(SITE_TOKEN_HEADER)
            .map(|value| constant_time_eq(value.as_bytes(), self.token.as_bytes()))
            .unwrap_or(false)
    }
}

impl<S, B> Service<ServiceRequest> for SiteTokenMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if self.public_paths.contains(req.path()) || self.is_authorized(&req) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        warn!(path = req.path(), "Rejected request: invalid or missing site token");
        let response = ApiError(WaypointError::Unauthorized).error_response();
        Box::pin(ready(Ok(req.into_response(response).map_into_right_body())))
    }
}

// Length still leaks, content does not
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Reflects allowed origins and answers every `OPTIONS` with an empty 204.
///
/// With an empty allow-list the middleware passes everything through.
pub struct Cors {
    allowed_origins: Arc<HashSet<String>>,
}

impl Cors {
    pub fn new<I, O>(origins: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<String>,
    {
        Self {
            allowed_origins: Arc::new(origins.into_iter().map(Into::into).collect()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Cors
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CorsMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorsMiddleware {
            service,
            allowed_origins: self.allowed_origins.clone(),
        }))
    }
}

pub struct CorsMiddleware<S> {
    service: S,
    allowed_origins: Arc<HashSet<String>>,
}

impl<S> CorsMiddleware<S> {
    fn allowed_origin(&self, req: &ServiceRequest) -> Option<HeaderValue> {
        let origin = req.headers().get(ORIGIN)?;
        let allowed = origin
            .to_str()
            .map(|o| self.allowed_origins.contains(o))
            .unwrap_or(false);
        allowed.then(|| origin.clone())
    }
}

impl<S, B> Service<ServiceRequest> for CorsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if self.allowed_origins.is_empty() {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        let origin = self.allowed_origin(&req);

        if req.method() == Method::OPTIONS {
            let mut response = HttpResponse::NoContent().finish();
            if let Some(origin) = origin {
                set_cors_headers(response.headers_mut(), origin);
            }
            return Box::pin(ready(Ok(req.into_response(response).map_into_right_body())));
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut response = fut.await?;
            if let Some(origin) = origin {
                set_cors_headers(response.headers_mut(), origin);
            }
            Ok(response.map_into_left_body())
        })
    }
}

fn set_cors_headers(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, X-Site-Token"),
    );
}
