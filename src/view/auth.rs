use axum::{
	extract::State,
	http::{header, HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	Form,
};
use serde::Serialize;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::{redirect, resolve, Viewer, HOME, LOGIN};
use crate::{
	error::{AppError, RouteError},
	extract::MaybeSession,
	route::auth::{
		self,
		model::{LoginInput, RegisterInput, Session},
	},
	session,
	store::Backend,
	AppState,
};

const FAILED: &str = "Something went wrong. Please try again.";

#[derive(Serialize)]
struct Page<'a> {
	viewer: Option<Viewer>,
	email: &'a str,
	username: &'a str,
	error: Option<&'a str>,
}

impl Page<'_> {
	fn blank() -> Self {
		Self {
			viewer: None,
			email: "",
			username: "",
			error: None,
		}
	}
}

/// The first message to show for a form that failed validation.
fn describe(errors: &ValidationErrors) -> &'static str {
	let fields = errors.field_errors();

	if fields.contains_key("email") {
		"Please enter a valid email address"
	} else if fields.contains_key("username") {
		"Username must be 3 to 16 letters or digits"
	} else {
		"Password must be between 8 and 128 characters"
	}
}

/// Sets the session cookie and sends the viewer to the post list.
fn signed_in(session: &Session) -> Response {
	(
		[(header::SET_COOKIE, session::create_cookie(session.id).to_string())],
		redirect(HOME),
	)
		.into_response()
}

/// The status and message shown for a failed sign-in or registration.
fn failure(error: RouteError<auth::Error>) -> (StatusCode, &'static str) {
	match error {
		RouteError::Route(error @ auth::Error::Argon(..)) => {
			tracing::error!(%error, "failed to hash password");

			(StatusCode::INTERNAL_SERVER_ERROR, FAILED)
		}
		RouteError::Route(auth::Error::EmailTaken) => (StatusCode::CONFLICT, "Email already taken"),
		RouteError::Route(auth::Error::UsernameTaken) => {
			(StatusCode::CONFLICT, "Username already taken")
		}
		RouteError::Route(..) => (StatusCode::UNAUTHORIZED, "Invalid email or password"),
		RouteError::App(error) => {
			tracing::error!(%error, "failed to authenticate");

			(StatusCode::INTERNAL_SERVER_ERROR, FAILED)
		}
	}
}

pub async fn login_page(
	State(state): State<AppState>,
	session: Result<MaybeSession, AppError>,
) -> Result<Response, AppError> {
	if resolve(session).is_some_and(|session| session.0.is_some()) {
		return Ok(redirect(HOME));
	}

	state
		.templates
		.render("login.html", StatusCode::OK, Page::blank())
}

pub async fn login(
	State(state): State<AppState>,
	Form(input): Form<LoginInput>,
) -> Result<Response, AppError> {
	// a malformed email or password can never match an account
	let result = match input.validate() {
		Ok(()) => auth::authenticate(&state, &input).await,
		Err(..) => Err(auth::Error::InvalidEmailOrPassword.into()),
	};

	let (status, message) = match result {
		Ok(session) => {
			tracing::info!(user = %session.user_id, "signed in");

			return Ok(signed_in(&session));
		}
		Err(error) => failure(error),
	};

	state.templates.render(
		"login.html",
		status,
		Page {
			email: &input.email,
			error: Some(message),
			..Page::blank()
		},
	)
}

pub async fn register_page(
	State(state): State<AppState>,
	session: Result<MaybeSession, AppError>,
) -> Result<Response, AppError> {
	if resolve(session).is_some_and(|session| session.0.is_some()) {
		return Ok(redirect(HOME));
	}

	state
		.templates
		.render("register.html", StatusCode::OK, Page::blank())
}

pub async fn register(
	State(state): State<AppState>,
	Form(input): Form<RegisterInput>,
) -> Result<Response, AppError> {
	let (status, message) = match input.validate() {
		Err(errors) => (StatusCode::UNPROCESSABLE_ENTITY, describe(&errors)),
		Ok(()) => match auth::enroll(&state, &input).await {
			Ok(session) => {
				tracing::info!(user = %session.user_id, "registered");

				return Ok(signed_in(&session));
			}
			Err(error) => failure(error),
		},
	};

	state.templates.render(
		"register.html",
		status,
		Page {
			viewer: None,
			email: &input.email,
			username: &input.username,
			error: Some(message),
		},
	)
}

/// Ends the viewer's session. The cookie is cleared even if the store fails.
pub async fn sign_out(State(store): State<Backend>, headers: HeaderMap) -> Response {
	let session_id = session::find_cookie(&headers).and_then(|id| Uuid::parse_str(&id).ok());

	if let Some(session_id) = session_id {
		if let Err(error) = store.delete_session(session_id).await {
			tracing::error!(%error, "failed to delete session");
		}
	}

	(
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		redirect(LOGIN),
	)
		.into_response()
}
