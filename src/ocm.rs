use anyhow::anyhow;
use reqwest::Url;
use serde::Deserialize;

const COUNTRY_CODE: &str = "IN";
const SEARCH_RADIUS_KM: u32 = 5000;
const MAX_RESULTS: u32 = 100;

/// A charging point as returned by the Open Charge Map POI API. The
/// directory omits fields freely, so everything nested is optional and
/// unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Poi {
    #[serde(default)]
    pub address_info: Option<AddressInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub access_comments: Option<String>,
}

#[derive(Clone)]
pub struct OcmClient {
    inner: reqwest::Client,
    base: Url,
    api_key: String,
}

impl OcmClient {
    pub fn new(client: reqwest::Client, base: &str, api_key: String) -> anyhow::Result<Self> {
        let base = base
            .parse()
            .map_err(|e| anyhow!("{base} is not a valid url: {e}"))?;

        Ok(Self {
            inner: client,
            base,
            api_key,
        })
    }

    /// Queries the directory for charging points around the given position.
    /// Single attempt; any transport or decode failure goes to the caller.
    pub async fn nearby(&self, lat: f64, lon: f64) -> Result<Vec<Poi>, reqwest::Error> {
        let pois = self
            .inner
            .get(self.base.clone())
            .query(&[
                ("output", "json".to_string()),
                ("countrycode", COUNTRY_CODE.to_string()),
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("distance", SEARCH_RADIUS_KM.to_string()),
                ("distanceunit", "KM".to_string()),
                ("maxresults", MAX_RESULTS.to_string()),
                ("compact", "true".to_string()),
                ("verbose", "false".to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(pois)
    }
}
