//! Server-rendered pages of the blog.
//!
//! Views never surface store errors to the reader. Failures are logged and
//! replaced by a generic message, or by a redirect back to the post list.

mod auth;
mod home;
mod post;

use std::sync::Arc;

use axum::{
	http::StatusCode,
	response::{Html, IntoResponse, Redirect, Response},
	routing::{get, post},
	Router,
};
use minijinja::Environment;
use serde::Serialize;
use uuid::Uuid;

use crate::{error::AppError, extract::MaybeSession, AppState};

pub const HOME: &str = "/";
pub const LOGIN: &str = "/login";

const TEMPLATES: [(&str, &str); 6] = [
	("base.html", include_str!("templates/base.html")),
	("nav.html", include_str!("templates/nav.html")),
	("home.html", include_str!("templates/home.html")),
	("post_form.html", include_str!("templates/post_form.html")),
	("login.html", include_str!("templates/login.html")),
	("register.html", include_str!("templates/register.html")),
];

pub fn routes() -> Router<AppState> {
	Router::new()
		.route(HOME, get(home::list))
		.route(LOGIN, get(auth::login_page).post(auth::login))
		.route("/register", get(auth::register_page).post(auth::register))
		.route("/sign-out", post(auth::sign_out))
		.route("/create-post", get(post::create_page).post(post::create))
		.route("/edit-post/:id", get(post::edit_page).post(post::edit))
		.route("/posts/:id/delete", post(home::delete))
}

/// The compiled page templates. HTML is escaped automatically.
#[derive(Clone)]
pub struct Templates(Arc<Environment<'static>>);

impl Templates {
	pub fn new() -> Result<Self, minijinja::Error> {
		let mut env = Environment::new();

		for (name, source) in TEMPLATES {
			env.add_template(name, source)?;
		}

		Ok(Self(Arc::new(env)))
	}

	pub fn render(
		&self,
		name: &str,
		status: StatusCode,
		context: impl Serialize,
	) -> Result<Response, AppError> {
		Ok((status, Html(self.html(name, context)?)).into_response())
	}

	fn html(&self, name: &str, context: impl Serialize) -> Result<String, minijinja::Error> {
		self.0.get_template(name)?.render(context)
	}
}

/// The signed-in user as seen by the navigation bar and the pages.
#[derive(Debug, Serialize)]
pub struct Viewer {
	pub id: Uuid,
	pub username: String,
}

impl Viewer {
	pub fn of(session: &MaybeSession) -> Option<Self> {
		session.0.as_ref().map(|session| Self {
			id: session.user.id,
			username: session.user.username.clone(),
		})
	}
}

/// Unwraps the viewer's session for a page.
///
/// A store failure while checking the cookie is logged and turned into `None`,
/// so the page can fall back to its own failure message instead of an error.
fn resolve(session: Result<MaybeSession, AppError>) -> Option<MaybeSession> {
	session
		.map_err(|error| tracing::error!(%error, "failed to resolve session"))
		.ok()
}

fn redirect(to: &str) -> Response {
	Redirect::to(to).into_response()
}
