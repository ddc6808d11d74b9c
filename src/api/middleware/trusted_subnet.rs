//! Trusted subnet guard for internal endpoints
//!
//! 请求必须带 `X-Real-IP`，且 IP 落在配置的 CIDR 内；未配置子网时一律拒绝。

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::CONTENT_TYPE,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{trace, warn};

use crate::utils::ip::{ip_in_subnet, real_ip_header};

#[derive(Clone, Debug, Default)]
pub struct TrustedSubnetGuard {
    subnet: Option<String>,
}

impl TrustedSubnetGuard {
    pub fn new(subnet: Option<String>) -> Self {
        Self {
            subnet: subnet.filter(|s| !s.trim().is_empty()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TrustedSubnetGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = TrustedSubnetMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TrustedSubnetMiddleware {
            service: Rc::new(service),
            subnet: self.subnet.clone(),
        }))
    }
}

pub struct TrustedSubnetMiddleware<S> {
    service: Rc<S>,
    subnet: Option<String>,
}

impl<S, B> Service<ServiceRequest> for TrustedSubnetMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        let allowed = real_ip_header(req.request())
            .is_some_and(|ip| ip_in_subnet(ip, self.subnet.as_deref()));

        Box::pin(async move {
            if !allowed {
                warn!("Rejected internal request to {}: untrusted source", req.path());
                return Ok(req.into_response(
                    HttpResponse::Forbidden()
                        .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
                        .body("forbidden")
                        .map_into_right_body(),
                ));
            }

            trace!("Trusted subnet check passed");
            let response = srv.call(req).await?.map_into_left_body();
            Ok(response)
        })
    }
}
