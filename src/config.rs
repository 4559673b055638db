use std::net::IpAddr;

use tracing::Level;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("{name} has an invalid value {value:?}")]
	Invalid { name: &'static str, value: String },
}

/// Runtime configuration, read from the environment (and a `.env` file, if present).
#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub host: IpAddr,
	pub port: u16,
	pub log_level: Level,
	/// Whether to export traces and metrics over OTLP.
	pub otlp: bool,
	pub run_migrations: bool,
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		dotenvy::dotenv().ok();

		Self::from_lookup(|name| std::env::var(name).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
		let database_url = lookup("DATABASE_URL").ok_or(Error::Missing("DATABASE_URL"))?;

		Ok(Self {
			database_url,
			host: parse(&lookup, "HOST", IpAddr::from([127, 0, 0, 1]))?,
			port: parse(&lookup, "PORT", 3000)?,
			log_level: parse(&lookup, "LOG_LEVEL", Level::INFO)?,
			otlp: lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
				.is_some_and(|endpoint| !endpoint.is_empty()),
			run_migrations: parse(&lookup, "RUN_MIGRATIONS", true)?,
		})
	}
}

fn parse<T: std::str::FromStr>(
	lookup: &impl Fn(&str) -> Option<String>,
	name: &'static str,
	default: T,
) -> Result<T, Error> {
	match lookup(name) {
		Some(value) => value.parse().map_err(|_| Error::Invalid { name, value }),
		None => Ok(default),
	}
}
