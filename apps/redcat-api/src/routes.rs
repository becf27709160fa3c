use axum::{
	Json, Router,
	extract::{Path, State, rejection::JsonRejection},
	http::StatusCode,
	middleware,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{metrics, state::AppState};
use redcat_domain::Place;
use redcat_service::{Error as ServiceError, SearchRequest, SearchResponse};

/// Body of a successful create.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceEnvelope {
	pub item: Place,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/healthz", get(health))
		.route("/metrics", get(metrics::scrape))
		.route("/places", post(add_place))
		.route("/places/search", post(search_places))
		.route("/places/{id}", get(get_place).delete(delete_place))
		.layer(middleware::from_fn_with_state(state.clone(), metrics::track))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn add_place(
	State(state): State<AppState>,
	payload: Result<Json<Place>, JsonRejection>,
) -> Result<(StatusCode, Json<PlaceEnvelope>), ApiError> {
	let Json(place) = payload?;
	let cancel = state.shutdown.child_token();
	let item = state.service.add(&cancel, place).await?;

	Ok((StatusCode::CREATED, Json(PlaceEnvelope { item })))
}

async fn get_place(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<Place>, ApiError> {
	let cancel = state.shutdown.child_token();
	let place = state.service.get(&cancel, &id).await?;

	Ok(Json(place))
}

async fn delete_place(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
	let cancel = state.shutdown.child_token();

	state.service.delete(&cancel, &id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn search_places(
	State(state): State<AppState>,
	payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
	let Json(req) = payload?;
	let cancel = state.shutdown.child_token();
	let response = state.service.search(&cancel, req).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::MissingField { field } => Self::new(
				StatusCode::BAD_REQUEST,
				"INVALID_REQUEST",
				format!("{field} is required."),
				Some(vec![field]),
			),
			ServiceError::InvalidRequest { message } =>
				Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None),
			ServiceError::StoreUnavailable { message } => {
				tracing::error!(error = %message, "Place store unavailable.");

				Self::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORE_UNAVAILABLE",
					"Place store is unavailable.",
					None,
				)
			},
			ServiceError::Decode { message } => {
				tracing::error!(error = %message, "Place store returned malformed data.");

				Self::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"DECODE_ERROR",
					"Place store returned malformed data.",
					None,
				)
			},
			ServiceError::Cancelled => Self::new(
				StatusCode::SERVICE_UNAVAILABLE,
				"CANCELLED",
				"Request was cancelled.",
				None,
			),
		}
	}
}
impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text(), None)
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
