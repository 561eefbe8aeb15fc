//! HTTP middleware for the SWAPI client.

use crate::utils::fmt_duration;
use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// Requests slower than this are logged at WARN.
const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_secs(2);

/// Logs every request with its status and latency.
pub struct TransactionLogger;

#[async_trait::async_trait]
impl Middleware for TransactionLogger {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let method = req.method().clone();
        let url = req.url().clone();
        let start = Instant::now();

        let result = next.run(req, extensions).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(response) => {
                let status = response.status().as_u16();
                if elapsed > SLOW_REQUEST_THRESHOLD {
                    warn!(
                        method = %method,
                        url = %url,
                        status,
                        duration = fmt_duration(elapsed),
                        "slow upstream request"
                    );
                } else {
                    trace!(
                        method = %method,
                        url = %url,
                        status,
                        duration = fmt_duration(elapsed),
                        "upstream request"
                    );
                }
            }
            Err(e) => {
                warn!(
                    method = %method,
                    url = %url,
                    duration = fmt_duration(elapsed),
                    error = ?e,
                    "upstream request failed"
                );
            }
        }

        result
    }
}
