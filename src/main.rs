#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod openapi;
mod ratelimit;
mod route;
mod session;
mod store;
mod submission;
mod trace;
mod view;


use std::{net::SocketAddr, sync::Arc};

use argon2::Argon2;
use tower_governor::GovernorLayer;

use crate::{
	config::Config,
	store::{Backend, PgStore},
	submission::Submissions,
	view::Templates,
};

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access.
/// Extractors that only need one of them, like the session, can ask for that
/// part alone through [`axum::extract::FromRef`].
#[derive(Clone, axum::extract::FromRef)]
pub struct AppState {
	pub store: Backend,
	pub hasher: Argon2<'static>,
	pub templates: Templates,
	pub submissions: Submissions,
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
	#[error("configuration error: {0}")]
	Config(#[from] config::Error),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
	#[error("template error: {0}")]
	Template(#[from] minijinja::Error),
	#[error("invalid rate limit configuration")]
	RateLimit,
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
	let config = Config::from_env()?;
	let _otel = trace::init_tracing_subscriber(&config);

	let store = PgStore::connect(&config.database_url).await?;

	if config.run_migrations {
		store.migrate().await?;
		tracing::info!("applied database migrations");
	}

	let state = AppState {
		store: Arc::new(store),
		hasher: Argon2::default(),
		templates: Templates::new()?,
		submissions: Submissions::default(),
	};

	let governor = ratelimit::default().ok_or(StartupError::RateLimit)?;

	ratelimit::cleanup_old_limits(&[&governor]);

	let app = route::router(state).layer(GovernorLayer { config: governor });

	let listener = tokio::net::TcpListener::bind((config.host, config.port)).await?;

	tracing::info!("listening on {}", listener.local_addr()?);

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.await?;

	Ok(())
}
