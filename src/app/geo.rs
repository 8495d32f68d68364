// LobbyScout - app/geo.rs
//
// IP-to-country lookup.
//
// The default service is ip-api.com: `GET {base}/{ip}` answers
// `{"status":"success","country":"Sweden",...}` or
// `{"status":"fail","message":"private range",...}`.

use crate::util::constants;
use crate::util::error::LookupError;
use std::future::Future;

/// Resolves a server address to a country name.
pub trait GeoLookup {
    fn country_of(&self, ip: &str) -> impl Future<Output = Result<String, LookupError>>;
}

#[derive(Debug, serde::Deserialize)]
struct IpApiResponse {
    status: String,
    country: Option<String>,
    message: Option<String>,
}

/// Client for an ip-api.com compatible service.
#[derive(Debug, Clone)]
pub struct IpApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl IpApiClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl GeoLookup for IpApiClient {
    async fn country_of(&self, ip: &str) -> Result<String, LookupError> {
        let url = format!("{}/{}", self.base_url, ip);
        tracing::debug!(%url, "Geolocation query");

        let body: IpApiResponse = self.http.get(&url).send().await?.json().await?;

        if body.status != constants::GEOLOCATION_SUCCESS_STATUS {
            return Err(LookupError::Unsuccessful {
                ip: ip.to_string(),
                message: body.message.unwrap_or(body.status),
            });
        }

        body.country.ok_or_else(|| LookupError::Unsuccessful {
            ip: ip.to_string(),
            message: "response has no country".to_string(),
        })
    }
}
