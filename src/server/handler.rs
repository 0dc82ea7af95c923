// src/server/handler.rs
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Body, Method, Request, Response, StatusCode};
use std::sync::Arc;
use tower::Service;

use crate::health::{Healthz, Status};

/// Serves the health report on a single path.
#[derive(Clone)]
pub struct HealthzHandler {
    healthz: Arc<Healthz>,
    path: Arc<str>,
}

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("aggregation task failed: {0}")]
    Aggregation(#[from] tokio::task::JoinError),

    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

impl HealthzHandler {
    pub fn new(healthz: Arc<Healthz>, path: impl Into<String>) -> Self {
        let path: String = path.into();
        Self {
            healthz,
            path: Arc::from(path),
        }
    }

    pub async fn handle(&self, req: Request<Body>) -> Result<Response<Body>, HandlerError> {
        if req.uri().path() != &*self.path {
            return Ok(plain(StatusCode::NOT_FOUND, "Not Found"));
        }
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return Ok(plain(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"));
        }

        // Checks are synchronous and may block.
        let healthz = self.healthz.clone();
        let report = tokio::task::spawn_blocking(move || healthz.aggregate()).await?;

        let body = if req.method() == Method::HEAD {
            Body::empty()
        } else {
            Body::from(serde_json::to_vec(&report)?)
        };

        let mut response = Response::new(body);
        *response.status_mut() = status_code(report.status);
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(response)
    }
}

/// 200 when everything passes, 409 for any degraded or failed rollup.
pub fn status_code(status: Status) -> StatusCode {
    if status.is_pass() {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    }
}

pub(crate) fn plain(status: StatusCode, message: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response
}

impl From<HandlerError> for Response<Body> {
    fn from(err: HandlerError) -> Self {
        tracing::error!(%err, "healthz handler error");
        plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }
}

impl Service<Request<Body>> for HealthzHandler {
    type Response = Response<Body>;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move { Ok(handler.handle(req).await.unwrap_or_else(Response::from)) })
    }
}
