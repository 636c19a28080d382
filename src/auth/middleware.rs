use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use log::debug;
use std::rc::Rc;

use crate::auth::resolver::authenticate;
use crate::error::AppError;
use crate::state::AppState;

/// Paths under the protected scope that are reachable without a token.
const PUBLIC_PATHS: &[&str] = &["/api/autenticacion/login"];

/// Resolves the caller of every protected request before any handler runs.
///
/// On success the resolved [`crate::models::User`] is stored in the request
/// extensions (read back through [`super::extractors::CurrentUser`]); otherwise the
/// request is answered with 401 without reaching the handler, so an
/// unauthenticated caller never learns whether a resource exists.
///
/// Rejections are produced as responses rather than service errors, so outer
/// middleware such as CORS still decorates them.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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
        if PUBLIC_PATHS.contains(&req.path()) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                let err = AppError::Configuration("AppState is not registered".into());
                return Ok(reject(req, &err));
            };

            let resolved = authenticate(req.headers(), &state.tokens, state.store.as_ref()).await;
            match resolved {
                Ok(Some(user)) => {
                    req.extensions_mut().insert(user);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Ok(None) => {
                    debug!("Unauthenticated request to {}", req.path());
                    Ok(reject(req, &AppError::unauthorized()))
                }
                Err(err) => Ok(reject(req, &err)),
            }
        })
    }
}

fn reject<B>(req: ServiceRequest, err: &AppError) -> ServiceResponse<EitherBody<B>> {
    req.into_response(err.error_response()).map_into_right_body()
}
