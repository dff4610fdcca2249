use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::database::MongoDB;
use crate::services::auth_service;
use crate::utils::error::AppError;

pub use crate::services::auth_service::Claims;

/// Bearer-token gate for the protected scopes. Verifies signature and
/// expiry, resolves the referenced user, and attaches both the claims and
/// the user record to the request before the handler runs.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
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
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let token = match bearer_token(&req) {
                Some(token) => token,
                None => return Err(AppError::Unauthenticated.into()),
            };

            let claims = auth_service::verify_token(&token)?;

            let db = req
                .app_data::<web::Data<MongoDB>>()
                .cloned()
                .ok_or_else(|| AppError::Database("Database handle missing".to_string()))?;

            // Token may outlive the account it refers to
            let user = auth_service::find_user_by_id(&db, &claims.sub).await?;

            req.extensions_mut().insert(claims);
            req.extensions_mut().insert(user);

            service.call(req).await
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use actix_web::ResponseError;

    #[test]
    fn test_bearer_token_extraction() {
        let req = TestRequest::get()
            .insert_header(("Authorization", "Bearer abc.def.ghi"))
            .to_srv_request();
        assert_eq!(bearer_token(&req), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_missing_header_yields_none() {
        let req = TestRequest::get().to_srv_request();
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn test_non_bearer_scheme_is_rejected() {
        let req = TestRequest::get()
            .insert_header(("Authorization", "Basic dXNlcjpwdw=="))
            .to_srv_request();
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn test_auth_failures_map_to_expected_statuses() {
        assert_eq!(AppError::Unauthenticated.status_code().as_u16(), 401);
        assert_eq!(AppError::InvalidToken.status_code().as_u16(), 401);
        assert_eq!(AppError::UserNotFound.status_code().as_u16(), 404);
    }
}
