use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

pub use route::{authenticate, enroll};

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid email or password")]
	InvalidEmailOrPassword,
	#[error("password hashing error")]
	Argon(#[from] argon2::Error),
	#[error("no session cookie")]
	NoSessionCookie,
	#[error("invalid session cookie")]
	InvalidSessionCookie,
	#[error("Username already taken")]
	UsernameTaken,
	#[error("Email already taken")]
	EmailTaken,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/login", post_with(login, login_docs))
		.api_route("/logout", post_with(logout, logout_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route("/me", get_with(get_me, get_me_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidEmailOrPassword | Self::NoSessionCookie | Self::InvalidSessionCookie => {
				StatusCode::UNAUTHORIZED
			}
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::UsernameTaken | Self::EmailTaken => StatusCode::CONFLICT,
		}
	}

	fn errors(&self) -> Vec<error::Message> {
		match self {
			Self::Argon(..) => Vec::new(),
			_ => vec![error::Message::new(self.to_string())],
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_signup_flow() {
		let app = server(store());

		let response = app
			.post("/api/auth/register")
			.json(&json!({
				"email": "john@smith.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		let response = app
			.post("/api/auth/login")
			.json(&json!({
				"email": "john@smith.com",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		let response = app.get("/api/auth/me").await;

		assert_eq!(response.status_code(), 200);

		let me = response.json::<serde_json::Value>();

		assert_eq!(me["username"], "john");
		assert!(me.get("email").is_none());
		assert!(me.get("password").is_none());

		let response = app.post("/api/auth/logout").await;

		assert_eq!(response.status_code(), 204);

		let response = app.get("/api/auth/me").await;

		assert_eq!(response.status_code(), 401);
	}

	#[tokio::test]
	async fn test_login_rejects_wrong_password() {
		let app = server(store());

		register(&app, "john").await;

		let response = app
			.post("/api/auth/login")
			.json(&json!({
				"email": "john@example.com",
				"password": "wrongpassword",
			}))
			.await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(
			response.json::<serde_json::Value>()["errors"][0]["content"],
			"Invalid email or password"
		);
	}

	#[tokio::test]
	async fn test_register_conflicts() {
		let app = server(store());

		register(&app, "john").await;

		let response = app
			.post("/api/auth/register")
			.json(&json!({
				"email": "john@example.com",
				"username": "johnny",
				"password": PASSWORD,
			}))
			.await;

		assert_eq!(response.status_code(), 409);

		let response = app
			.post("/api/auth/register")
			.json(&json!({
				"email": "other@example.com",
				"username": "john",
				"password": PASSWORD,
			}))
			.await;

		assert_eq!(response.status_code(), 409);
	}

	#[tokio::test]
	async fn test_register_validates_input() {
		let app = server(store());

		let response = app
			.post("/api/auth/register")
			.json(&json!({
				"email": "john@example.com",
				"username": "jo hn",
				"password": PASSWORD,
			}))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<serde_json::Value>()["errors"][0]["field"],
			"username"
		);
	}
}
