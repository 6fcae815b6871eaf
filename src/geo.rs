//! Location resolution and the location-derived query shapes used by sources.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::model::LocationInfo;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// `None` when the place is unknown.
    async fn resolve(&self, location: &str) -> Option<LocationInfo>;
    fn name(&self) -> &'static str;
}

impl LocationInfo {
    /// Best-effort record when the geocoder itself failed: the input is taken
    /// to be a country name.
    pub fn unresolved(input: &str) -> Self {
        Self {
            input_location: input.to_string(),
            formatted_address: input.to_string(),
            country: Some(input.to_string()),
            country_code: None,
            city: None,
            state: None,
            coordinates: None,
        }
    }

    /// Place names from most to least specific: city, state, country.
    pub fn place_terms(&self) -> Vec<&str> {
        [&self.city, &self.state, &self.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// `"<query> AND (<city> OR <state> OR <country>)"`; `None` with no place terms.
pub fn location_query(query: &str, info: &LocationInfo) -> Option<String> {
    let terms = info.place_terms();
    if terms.is_empty() {
        return None;
    }
    Some(format!("{query} AND ({})", terms.join(" OR ")))
}

/// Subreddits worth searching for a place: `<place>`, `<place>news`,
/// `<place>politics` for each place term, lowercased, spaces removed, no repeats.
pub fn location_subreddits(info: &LocationInfo) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for place in info.place_terms() {
        let base: String = place
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .flat_map(char::to_lowercase)
            .collect();
        if base.is_empty() {
            continue;
        }
        for name in [base.clone(), format!("{base}news"), format!("{base}politics")] {
            if !out.contains(&name) {
                out.push(name);
            }
        }
    }
    out
}

/// Sentence prepended to the summary in location-aware mode.
pub fn location_context(info: &LocationInfo) -> String {
    format!(
        "The following summary is based on content from {}. \
         Consider the local context and perspectives when interpreting the information.",
        info.formatted_address
    )
}

// ---------- Nominatim (OpenStreetMap) ----------

#[derive(Debug, Deserialize)]
struct Place {
    display_name: String,
    lat: Option<String>,
    lon: Option<String>,
    #[serde(default)]
    address: HashMap<String, String>,
}

/// Geocoder backed by the public Nominatim search API.
pub struct NominatimResolver {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimResolver {
    pub fn new(user_agent: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .context("building geocoder http client")?;
        Ok(Self {
            http,
            base_url: NOMINATIM_URL.to_string(),
        })
    }

    async fn lookup(&self, location: &str) -> anyhow::Result<Option<LocationInfo>> {
        let places: Vec<Place> = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", location),
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("limit", "1"),
                ("accept-language", "en"),
            ])
            .send()
            .await
            .context("geocoder request")?
            .error_for_status()
            .context("geocoder status")?
            .json()
            .await
            .context("geocoder json")?;

        Ok(places.into_iter().next().map(|p| place_to_info(location, p)))
    }
}

fn place_to_info(input: &str, p: Place) -> LocationInfo {
    let addr = &p.address;
    // Nominatim reports smaller places as town/village instead of city.
    let city = ["city", "town", "village"]
        .iter()
        .find_map(|k| addr.get(*k).cloned());
    let coordinates = match (
        p.lat.as_deref().and_then(|s| s.parse::<f64>().ok()),
        p.lon.as_deref().and_then(|s| s.parse::<f64>().ok()),
    ) {
        (Some(lat), Some(lon)) => Some((lat, lon)),
        _ => None,
    };

    LocationInfo {
        input_location: input.to_string(),
        formatted_address: p.display_name,
        country: addr.get("country").cloned().or_else(|| Some(input.to_string())),
        country_code: addr.get("country_code").map(|c| c.to_uppercase()),
        city,
        state: addr.get("state").cloned(),
        coordinates,
    }
}

#[async_trait]
impl LocationResolver for NominatimResolver {
    async fn resolve(&self, location: &str) -> Option<LocationInfo> {
        let location = location.trim();
        if location.is_empty() {
            return None;
        }
        match self.lookup(location).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(target: "collab", error = ?e, "geocoder failed; treating input as country");
                Some(LocationInfo::unresolved(location))
            }
        }
    }

    fn name(&self) -> &'static str {
        "nominatim"
    }
}

// ---------- Static (tests, offline runs) ----------

/// Resolver over a fixed, case-insensitive table.
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    places: HashMap<String, LocationInfo>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, info: LocationInfo) -> Self {
        self.places.insert(key.trim().to_lowercase(), info);
        self
    }
}

#[async_trait]
impl LocationResolver for StaticResolver {
    async fn resolve(&self, location: &str) -> Option<LocationInfo> {
        self.places.get(&location.trim().to_lowercase()).cloned()
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn austin() -> LocationInfo {
        LocationInfo {
            input_location: "Austin".into(),
            formatted_address: "Austin, Travis County, Texas, United States".into(),
            country: Some("United States".into()),
            country_code: Some("US".into()),
            city: Some("Austin".into()),
            state: Some("Texas".into()),
            coordinates: Some((30.27, -97.74)),
        }
    }

    #[test]
    fn query_joins_place_terms() {
        assert_eq!(
            location_query("transit", &austin()).as_deref(),
            Some("transit AND (Austin OR Texas OR United States)")
        );
        let bare = LocationInfo {
            country: None,
            ..LocationInfo::unresolved("x")
        };
        assert_eq!(location_query("transit", &bare), None);
    }

    #[test]
    fn subreddits_are_lowercase_without_spaces() {
        let subs = location_subreddits(&austin());
        assert_eq!(&subs[..3], &["austin", "austinnews", "austinpolitics"]);
        assert!(subs.contains(&"unitedstates".to_string()));
        assert_eq!(subs.len(), 9);
    }

    #[test]
    fn nominatim_place_maps_to_info() {
        let raw = r#"{"display_name":"Lyon, France","lat":"45.75","lon":"4.85",
            "address":{"town":"Lyon","state":"Auvergne-Rhone-Alpes","country":"France","country_code":"fr"}}"#;
        let p: Place = serde_json::from_str(raw).unwrap();
        let info = place_to_info("lyon", p);
        assert_eq!(info.city.as_deref(), Some("Lyon"));
        assert_eq!(info.country_code.as_deref(), Some("FR"));
        assert_eq!(info.coordinates, Some((45.75, 4.85)));
        assert_eq!(info.input_location, "lyon");
    }

    #[tokio::test]
    async fn static_resolver_is_case_insensitive() {
        let r = StaticResolver::new().with("Austin", austin());
        assert!(r.resolve(" AUSTIN ").await.is_some());
        assert!(r.resolve("Atlantis").await.is_none());
    }

    #[test]
    fn context_mentions_address() {
        assert!(location_context(&austin()).contains("Austin, Travis County"));
    }
}
