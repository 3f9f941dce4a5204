use serde::Serialize;

use crate::geo::haversine_distance;
use crate::ocm::Poi;

const MAX_STATIONS: usize = 10;
const DEFAULT_NAME: &str = "Unknown Station";
const DEFAULT_COMMENT: &str = "No comment available";

/// A charging station ready to be pushed to the frontend, with its distance
/// in km from the reported user position.
#[derive(Debug, Clone, Serialize)]
pub struct RankedStation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub comment: String,
    pub distance: f64,
}

/// Maps raw directory records to ranked stations. Records missing either
/// coordinate are dropped, the rest are sorted by distance from the origin
/// and capped at the ten closest. A coordinate of exactly 0.0 is a real
/// position and is kept.
pub fn rank_stations(lat: f64, lon: f64, pois: &[Poi]) -> Vec<RankedStation> {
    let mut stations: Vec<RankedStation> = pois
        .iter()
        .filter_map(|poi| {
            let info = poi.address_info.clone().unwrap_or_default();
            let station_lat = info.latitude?;
            let station_lon = info.longitude?;

            Some(RankedStation {
                name: info.title.unwrap_or_else(|| DEFAULT_NAME.to_string()),
                lat: station_lat,
                lon: station_lon,
                comment: info
                    .access_comments
                    .unwrap_or_else(|| DEFAULT_COMMENT.to_string()),
                distance: haversine_distance(lat, lon, station_lat, station_lon),
            })
        })
        .collect();

    stations.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    stations.truncate(MAX_STATIONS);
    stations
}
