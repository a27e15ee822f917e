//! Request handlers

use axum::{
    Json,
    extract::{Query, State},
};
use greeter_core::{ApiResponse, HomeResponse};
use tracing::info;

use crate::{client_ip::ClientIp, error::ApiError, state::AppState};

pub const VISITOR_NAME_PARAM: &str = "visitor_name";

/// First value of `name`; later repeats of the same key are ignored.
pub fn first_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// Static welcome message; never touches a provider.
pub async fn home(ClientIp(ip): ClientIp) -> Json<HomeResponse> {
    let message = format!("Welcome to the visitor greeter! Your IP is: {ip}");
    info!("{message}");

    Json(HomeResponse { message })
}

pub async fn hello(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ApiResponse>, ApiError> {
    let visitor_name = first_param(&params, VISITOR_NAME_PARAM);
    let response = state.greeter.greet(visitor_name, ip).await?;

    info!(client_ip = %response.client_ip, location = %response.location, "Greeted visitor");
    Ok(Json(response))
}
