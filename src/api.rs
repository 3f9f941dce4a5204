use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::genai::TextModel;
use crate::ocm::OcmClient;

const NO_STATIONS_INSIGHT: &str = "No stations available to analyze.";
const FALLBACK_INSIGHT: &str =
    "Charging insight is temporarily unavailable. Please try again later.";

#[derive(Clone)]
pub struct AppState {
    pub ocm: OcmClient,
    pub model: Arc<dyn TextModel>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VehicleType {
    Car,
    Bike,
    Scooter,
}

impl VehicleType {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "Car" => Some(Self::Car),
            "Bike" => Some(Self::Bike),
            "Scooter" => Some(Self::Scooter),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Car => "Car",
            Self::Bike => "Bike",
            Self::Scooter => "Scooter",
        }
    }
}

pub async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub slot: String,
    pub eta: u32,
    pub swaps_available: u32,
}

/// Placeholder slot optimizer; the payload is a canned answer.
pub async fn optimize(Json(request): Json<OptimizeRequest>) -> Json<OptimizeResponse> {
    info!(
        "Optimize requested for '{}' at ({}, {})",
        request.name, request.lat, request.lon
    );

    Json(OptimizeResponse {
        slot: "Slot A2".to_string(),
        eta: 12,
        swaps_available: 3,
    })
}

#[derive(Debug, Deserialize)]
pub struct PredictTimeRequest {
    pub vehicle_type: String,
    pub distance: f64,
}

#[derive(Debug, Serialize)]
pub struct PredictTimeResponse {
    pub predicted_time_min: Option<u32>,
}

pub async fn predict_time(
    State(state): State<AppState>,
    Json(request): Json<PredictTimeRequest>,
) -> Result<Json<PredictTimeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let vehicle = VehicleType::parse(&request.vehicle_type).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("unsupported vehicle type '{}'", request.vehicle_type),
            }),
        )
    })?;

    let prompt = format!(
        "Estimate the charging time in minutes for a {} that has to travel {:.2} km \
         to reach an EV charging station. Reply with a single number.",
        vehicle.as_str(),
        request.distance
    );

    let generated = state.model.generate(&prompt).await.map_err(|e| {
        warn!("charging time prediction failed: {e}");
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: "prediction model unavailable".to_string(),
            }),
        )
    })?;

    Ok(Json(PredictTimeResponse {
        predicted_time_min: first_number(&generated),
    }))
}

/// First run of decimal digits in the generated text, if any.
fn first_number(text: &str) -> Option<u32> {
    let digits = Regex::new(r"\d+").ok()?;
    digits.find(text)?.as_str().parse().ok()
}

#[derive(Debug, Deserialize)]
pub struct InsightRequest {
    pub stations: Vec<InsightStation>,
}

/// Only the name and distance of each station feed the prompt; anything
/// else the frontend echoes back is ignored.
#[derive(Debug, Deserialize)]
pub struct InsightStation {
    pub name: String,
    pub distance: f64,
}

#[derive(Debug, Serialize)]
pub struct InsightResponse {
    pub insight: String,
}

pub async fn ai_insight(
    State(state): State<AppState>,
    Json(request): Json<InsightRequest>,
) -> Json<InsightResponse> {
    if request.stations.is_empty() {
        return Json(InsightResponse {
            insight: NO_STATIONS_INSIGHT.to_string(),
        });
    }

    let listing = request
        .stations
        .iter()
        .take(3)
        .enumerate()
        .map(|(i, s)| format!("{}. {} ({:.1} km away)", i + 1, s.name, s.distance))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "These are the EV charging stations closest to the user:\n{listing}\n\
         Give a short recommendation on which station to pick."
    );

    let insight = match state.model.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!("insight generation failed: {e}");
            FALLBACK_INSIGHT.to_string()
        }
    };

    Json(InsightResponse { insight })
}
