//! Stop-list REST fetch.

use reqwest::Url;
use reqwest::header::HeaderMap;

use crate::domain::Stop;
use crate::http::HttpTransport;

use super::convert::{StopListResponse, convert_stops};
use super::error::StopListError;

/// Fetch and convert a network's stop list.
///
/// The body must be a JSON object; a missing `stops` key is an empty list.
pub async fn fetch_stop_list<T: HttpTransport>(
    transport: &T,
    url: &Url,
    headers: &HeaderMap,
) -> Result<Vec<Stop>, StopListError> {
    let body = transport.get(url, headers).await?;

    let response: StopListResponse =
        serde_json::from_str(&body).map_err(|e| StopListError::Json {
            message: e.to_string(),
        })?;

    Ok(convert_stops(&response))
}
