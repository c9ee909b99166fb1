/// HTTP middleware for catalyst-service
///
/// Authentication happens upstream; the gateway forwards the authenticated
/// user id in the `x-user-id` header. [`GatewayIdentity`] lifts that header
/// into request extensions so handlers can extract [`Viewer`] (optional) or
/// [`UserId`] (required).
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{error::ErrorBadRequest, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use uuid::Uuid;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated user, required
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

/// Whoever is looking; `None` for anonymous requests
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewer(pub Option<Uuid>);

pub struct GatewayIdentity;

impl<S, B> Transform<S, ServiceRequest> for GatewayIdentity
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = GatewayIdentityService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(GatewayIdentityService {
            service: Rc::new(service),
        }))
    }
}

pub struct GatewayIdentityService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for GatewayIdentityService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let header = req
                .headers()
                .get(USER_ID_HEADER)
                .map(|value| value.to_str().map(str::trim));

            let viewer = match header {
                None => None,
                Some(Ok(raw)) if raw.is_empty() => None,
                Some(Ok(raw)) => Some(
                    Uuid::parse_str(raw)
                        .map_err(|_| ErrorBadRequest("Invalid x-user-id header"))?,
                ),
                Some(Err(_)) => return Err(ErrorBadRequest("Invalid x-user-id header")),
            };

            req.extensions_mut().insert(Viewer(viewer));

            service.call(req).await
        })
    }
}

impl FromRequest for Viewer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(req.extensions().get::<Viewer>().copied().unwrap_or_default()))
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Viewer>()
                .and_then(|viewer| viewer.0)
                .map(UserId)
                .ok_or_else(|| {
                    AppError::Unauthorized("authenticated user required".to_string()).into()
                }),
        )
    }
}
