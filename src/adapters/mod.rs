// Adapters layer: concrete HTTP implementations of the domain ports.

pub mod brave;
pub mod nass;
pub mod nominatim;
pub mod openai;
pub mod soil;

use crate::utils::error::{AdvisorError, Result};
use reqwest::{Client, Response};
use std::time::Duration;

const MAX_ERROR_BODY: usize = 300;

pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// 非 2xx 回應轉為 UpstreamError
pub(crate) async fn ensure_success(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }

    tracing::debug!("{} responded {}: {}", service, status, body);
    Err(AdvisorError::UpstreamError {
        service: service.to_string(),
        status: status.as_u16(),
        message: body,
    })
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
