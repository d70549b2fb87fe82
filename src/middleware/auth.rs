use crate::core::AppError;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures_util::future::LocalBoxFuture;
use sha2::{Digest, Sha256};
use std::future::{ready, Ready};
use std::rc::Rc;

pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

fn digest(key: &str) -> [u8; 32] {
    Sha256::digest(key.as_bytes()).into()
}

/// Admin key authentication middleware
///
/// Wraps the `/admin` scope. Keys are compared by SHA-256 digest so the
/// comparison does not depend on where the first differing byte is.
#[derive(Clone)]
pub struct AdminKeyAuth {
    expected: Rc<[u8; 32]>,
}

impl AdminKeyAuth {
    pub fn new(admin_key: &str) -> Self {
        Self {
            expected: Rc::new(digest(admin_key)),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminKeyAuthMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminKeyAuthMiddleware {
            service: Rc::new(service),
            expected: self.expected.clone(),
        }))
    }
}

pub struct AdminKeyAuthMiddleware<S> {
    service: Rc<S>,
    expected: Rc<[u8; 32]>,
}

impl<S, B> Service<ServiceRequest> for AdminKeyAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let expected = self.expected.clone();

        Box::pin(async move {
            let key = req
                .headers()
                .get(ADMIN_KEY_HEADER)
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| Error::from(AppError::unauthorized("Missing X-Admin-Key header")))?;

            if digest(key) != *expected {
                tracing::warn!(path = %req.path(), "Rejected admin request with invalid key");
                return Err(Error::from(AppError::unauthorized("Invalid admin key")));
            }

            svc.call(req).await
        })
    }
}
