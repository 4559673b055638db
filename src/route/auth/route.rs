use aide::axum::IntoApiResponse;
use argon2::Argon2;
use axum::{
	extract::State,
	http::{header, StatusCode},
};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Session},
	openapi::tag,
	session,
	store::{self, Backend, NewUser, Unique},
	AppState,
};

use super::{model, Error, RouteError};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's id as a salt.
fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Checks the credentials and opens a new session for the user.
pub async fn authenticate(
	state: &AppState,
	input: &model::LoginInput,
) -> Result<model::Session, RouteError> {
	let user = state
		.store
		.find_user_by_email(&input.email)
		.await?
		.ok_or(Error::InvalidEmailOrPassword)?;

	let hashed = hash_password(&state.hasher, &input.password, &user.id).map_err(Error::Argon)?;

	if user.password != hashed {
		return Err(Error::InvalidEmailOrPassword.into());
	}

	Ok(state.store.create_session(user.id).await?)
}

/// Creates a new account and opens its first session.
pub async fn enroll(
	state: &AppState,
	input: &model::RegisterInput,
) -> Result<model::Session, RouteError> {
	let id = Uuid::new_v4();
	let hashed = hash_password(&state.hasher, &input.password, &id).map_err(Error::Argon)?;

	state
		.store
		.register(NewUser {
			id,
			email: input.email.clone(),
			username: input.username.clone(),
			password: hashed.to_vec(),
		})
		.await
		.map_err(|e| match e {
			store::Error::Conflict(Unique::Email) => Error::EmailTaken.into(),
			store::Error::Conflict(Unique::Username) => Error::UsernameTaken.into(),
			e => RouteError::from(e),
		})
}

/// Log in
/// Logs in to an account, returning an associated session cookie.
#[route(tag = tag::AUTH, response(status = 200, description = "Logged in successfully.", shape = "Json<model::Session>"))]
pub async fn login(
	State(state): State<AppState>,
	Json(auth): Json<model::LoginInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let session = authenticate(&state, &auth).await?;
	let cookie = session::create_cookie(session.id);

	Ok(([(header::SET_COOKIE, cookie.to_string())], Json(session)))
}

/// Log out
/// Logs out of the authenticated account, invalidating the session cookie.
#[route(tag = tag::AUTH, response(status = 204, description = "Logged out successfully."))]
pub async fn logout(
	State(store): State<Backend>,
	session: Session,
) -> Result<impl IntoApiResponse, RouteError> {
	store.delete_session(session.id).await?;

	// Clear the session cookie
	Ok((
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		StatusCode::NO_CONTENT,
	))
}

/// Register account
/// Registers a new account, returning an associated session cookie.
#[route(tag = tag::AUTH, response(status = 200, description = "Registered successfully.", shape = "Json<model::Session>"))]
pub async fn register(
	State(state): State<AppState>,
	Json(auth): Json<model::RegisterInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let session = enroll(&state, &auth).await?;
	let cookie = session::create_cookie(session.id);

	Ok(([(header::SET_COOKIE, cookie.to_string())], Json(session)))
}

/// Get user
/// Returns the authenticated user.
#[route(tag = tag::AUTH)]
pub async fn get_me(session: Session) -> Json<model::User> {
	Json(session.user)
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_hash_is_salted_with_the_user_id() {
		let hasher = Argon2::default();
		let a = hash_password(&hasher, "hunter2hunter", &Uuid::new_v4()).unwrap();
		let b = hash_password(&hasher, "hunter2hunter", &Uuid::new_v4()).unwrap();

		assert_ne!(a, b);
	}
}
