use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;
use tower_governor::GovernorError;

use crate::store;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message presented to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message {
	/// A machine-readable description of the error.
	pub content: String,
	/// The input field that caused the error, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<String>,
	/// Additional context about the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Map>,
}

impl Message {
	pub fn new(content: impl Into<String>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	pub fn field(mut self, field: impl Into<String>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(Map::new)
			.insert(key.into(), value.into());
		self
	}
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse {
	pub success: bool,
	pub errors: Vec<Message>,
}

/// Describes how an error is presented to the client.
///
/// The [`std::fmt::Display`] implementation is only ever logged, so it can
/// contain sensitive information. [`ErrorShape::errors`] is what gets sent.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;
	fn errors(&self) -> Vec<Message>;
}

/// Errors shared by every route, mostly coming from extractors and the store.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0:?}")]
	Json(axum_jsonschema::JsonSchemaRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
	#[error("template error: {0}")]
	Template(#[from] minijinja::Error),
	#[error("rate limit error: {0}")]
	RateLimit(#[from] GovernorError),
}

impl From<axum_jsonschema::JsonSchemaRejection> for AppError {
	fn from(rejection: axum_jsonschema::JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Json(..) => StatusCode::BAD_REQUEST,
			Self::Path(..) => StatusCode::NOT_FOUND,
			Self::RateLimit(GovernorError::TooManyRequests { .. }) => StatusCode::TOO_MANY_REQUESTS,
			Self::Store(..) | Self::Template(..) | Self::RateLimit(..) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	pub fn errors(&self) -> Vec<Message> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors.iter().map(move |error| {
						Message::new(
							error
								.message
								.as_ref()
								.map_or_else(|| error.code.to_string(), ToString::to_string),
						)
						.field(field.to_string())
					})
				})
				.collect(),
			Self::Json(..) => vec![Message::new("invalid_json")],
			Self::Path(error) => vec![Message::new(error.body_text())],
			Self::RateLimit(GovernorError::TooManyRequests { wait_time, .. }) => {
				vec![Message::new("too_many_requests").detail("wait_time", *wait_time)]
			}
			Self::Store(..) | Self::Template(..) | Self::RateLimit(..) => Vec::new(),
		}
	}
}

/// The error type returned by route handlers.
///
/// `T` is the route-specific error, everything else is an [`AppError`].
#[derive(Debug, thiserror::Error)]
pub enum RouteError<T> {
	#[error(transparent)]
	App(AppError),
	#[error(transparent)]
	Route(T),
}

impl<T: ErrorShape> From<T> for RouteError<T> {
	fn from(error: T) -> Self {
		Self::Route(error)
	}
}

impl<T> From<AppError> for RouteError<T> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<T> From<store::Error> for RouteError<T> {
	fn from(error: store::Error) -> Self {
		Self::App(AppError::Store(error))
	}
}

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => respond(&error, error.status(), error.errors()),
		}
	}
}

impl<T> OperationOutput for RouteError<T> {
	type Inner = Self;
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		match self {
			// carries the schema validation output, which is more useful than ours
			Self::Json(rejection) => rejection.into_response(),
			error => respond(&error, error.status(), error.errors()),
		}
	}
}

impl OperationOutput for AppError {
	type Inner = Self;
}

fn respond(
	error: &dyn std::error::Error,
	status: StatusCode,
	errors: Vec<Message>,
) -> Response<Body> {
	if status.is_server_error() {
		tracing::error!(%error, "request failed");
	} else {
		tracing::debug!(%error, "request rejected");
	}

	(
		status,
		Json(ErrorResponse {
			success: false,
			errors,
		}),
	)
		.into_response()
}
