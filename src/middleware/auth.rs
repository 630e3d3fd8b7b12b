use crate::core::AppError;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::LocalBoxFuture;
use sha2::{Digest, Sha256};
use sqlx::MySqlPool;
use std::future::{ready, Ready};
use std::rc::Rc;

/// Operator token authentication middleware.
///
/// Every audit-bearing mutation (generation runs, mark-paid, revert) must be
/// attributed to a real operator, so the resolved identity is stored in
/// request extensions and extracted by handlers — there is no anonymous or
/// placeholder actor path.
pub struct OperatorAuth {
    pool: MySqlPool,
}

impl OperatorAuth {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl<S, B> Transform<S, ServiceRequest> for OperatorAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = OperatorAuthMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(OperatorAuthMiddleware {
            service: Rc::new(service),
            pool: self.pool.clone(),
        }))
    }
}

pub struct OperatorAuthMiddleware<S> {
    service: Rc<S>,
    pool: MySqlPool,
}

impl<S, B> Service<ServiceRequest> for OperatorAuthMiddleware<S>
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
        let pool = self.pool.clone();

        Box::pin(async move {
            // Liveness and identity endpoints stay open
            let path = req.path();
            if path == "/health" || path == "/" {
                return svc.call(req).await;
            }

            let token = req
                .headers()
                .get("X-Operator-Token")
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| {
                    Error::from(AppError::unauthorized("Missing X-Operator-Token header"))
                })?;

            let operator = resolve_operator(&pool, token).await.map_err(Error::from)?;

            tracing::debug!(operator_id = %operator.id, "Operator authenticated");
            req.extensions_mut().insert(operator);

            svc.call(req).await
        })
    }
}

/// The acting operator, resolved from the presented token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OperatorContext {
    pub id: String,
    pub display_name: String,
}

impl FromRequest for OperatorContext {
    type Error = Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let operator = req.extensions().get::<OperatorContext>().cloned();
        ready(operator.ok_or_else(|| {
            Error::from(AppError::unauthorized("No authenticated operator on request"))
        }))
    }
}

/// Hex-encoded SHA-256 digest of an operator token.
///
/// Tokens are high-entropy machine secrets; only digests are stored, and the
/// lookup is by exact digest match so no plaintext comparison ever happens.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

async fn resolve_operator(pool: &MySqlPool, token: &str) -> crate::core::Result<OperatorContext> {
    let digest = token_digest(token);

    let operator = sqlx::query_as::<_, OperatorContext>(
        r#"
        SELECT id, display_name
        FROM operators
        WHERE token_digest = ? AND is_active = TRUE
        LIMIT 1
        "#,
    )
    .bind(&digest)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| AppError::unauthorized("Invalid operator token"))?;

    Ok(operator)
}
