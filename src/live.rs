use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::ocm::OcmClient;
use crate::rank::{rank_stations, RankedStation};

const LOCATION_UPDATE_EVENT: &str = "location_update";
const EV_STATIONS_EVENT: &str = "ev_stations";

/// Wire format of the live channel, both directions:
/// `{"event": <name>, "data": <payload>}`.
#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct LocationUpdate {
    #[serde(deserialize_with = "coordinate")]
    lat: f64,
    #[serde(deserialize_with = "coordinate")]
    lon: f64,
}

/// The frontend sends coordinates either as numbers or as strings depending
/// on the geolocation source; both must parse numerically.
fn coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// One session of the live channel. Events are handled to completion in
/// arrival order; every `location_update` gets exactly one `ev_stations`
/// response on the same socket.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    while let Some(Ok(message)) = receiver.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let envelope: Envelope = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("ignoring non-envelope frame: {e}");
                continue;
            }
        };

        if envelope.event != LOCATION_UPDATE_EVENT {
            debug!("no handler for event '{}'", envelope.event);
            continue;
        }

        let stations = ev_stations(&state.ocm, envelope.data).await;
        let payload = json!({
            "event": EV_STATIONS_EVENT,
            "data": { "stations": stations },
        });

        if sender
            .send(Message::Text(payload.to_string().into()))
            .await
            .is_err()
        {
            break;
        }
    }
}

/// The whole location pipeline behind a single failure boundary: an
/// unparseable payload, a directory failure, or an undecodable response all
/// collapse to an empty station list.
async fn ev_stations(ocm: &OcmClient, data: serde_json::Value) -> Vec<RankedStation> {
    let update: LocationUpdate = match serde_json::from_value(data) {
        Ok(update) => update,
        Err(e) => {
            warn!("bad location_update payload: {e}");
            return Vec::new();
        }
    };

    info!("Location received: ({}, {})", update.lat, update.lon);

    match ocm.nearby(update.lat, update.lon).await {
        Ok(pois) => {
            let stations = rank_stations(update.lat, update.lon, &pois);
            info!("Sending {} EV stations to frontend", stations.len());
            stations
        }
        Err(e) => {
            warn!("charging station lookup failed: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POI_BODY: &str = r#"[
        {
            "AddressInfo": {
                "Title": "MG Road Charging Point",
                "Latitude": 12.9758,
                "Longitude": 77.6045,
                "AccessComments": "Basement parking"
            }
        },
        {
            "AddressInfo": {
                "Title": "Whitefield Supercharge",
                "Latitude": 12.9698,
                "Longitude": 77.7499
            }
        },
        {
            "AddressInfo": {
                "Title": "No coordinates"
            }
        }
    ]"#;

    fn client_for(server: &mockito::Server) -> OcmClient {
        OcmClient::new(reqwest::Client::new(), &server.url(), "test-key".into()).unwrap()
    }

    #[tokio::test]
    async fn location_update_ranks_the_reachable_stations() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(POI_BODY)
            .create_async()
            .await;

        let ocm = client_for(&server);
        let stations = ev_stations(&ocm, json!({"lat": 12.9716, "lon": 77.5946})).await;

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].name, "MG Road Charging Point");
        assert!(stations[0].distance < stations[1].distance);
    }

    #[tokio::test]
    async fn string_coordinates_are_accepted() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(POI_BODY)
            .create_async()
            .await;

        let ocm = client_for(&server);
        let stations = ev_stations(&ocm, json!({"lat": "12.9716", "lon": "77.5946"})).await;

        assert_eq!(stations.len(), 2);
    }

    #[tokio::test]
    async fn unparseable_coordinates_emit_an_empty_list_without_a_lookup() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .expect(0)
            .create_async()
            .await;

        let ocm = client_for(&server);
        let stations = ev_stations(&ocm, json!({"lat": "not a number", "lon": 77.5946})).await;

        assert!(stations.is_empty());
        mock.assert();
    }

    #[tokio::test]
    async fn missing_coordinates_emit_an_empty_list() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").expect(0).create_async().await;

        let ocm = client_for(&server);
        let stations = ev_stations(&ocm, json!({"lat": 12.9716})).await;

        assert!(stations.is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_emits_an_empty_list() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(500)
            .create_async()
            .await;

        let ocm = client_for(&server);
        let stations = ev_stations(&ocm, json!({"lat": 12.9716, "lon": 77.5946})).await;

        assert!(stations.is_empty());
    }

    #[tokio::test]
    async fn empty_upstream_list_emits_an_empty_list() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let ocm = client_for(&server);
        let stations = ev_stations(&ocm, json!({"lat": 12.9716, "lon": 77.5946})).await;

        assert!(stations.is_empty());
    }
}
