//! The data backend behind every view and API route.
//!
//! Handlers never talk to the database directly, they go through [`Store`] so
//! the same authorization filters apply everywhere.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use std::{fmt, sync::Arc};

use uuid::Uuid;

use crate::route::{
	auth::model::{Session, User},
	post::model::{AuthoredPost, Post, PostDraft},
};

pub use postgres::PgStore;

/// A shared handle to the store, stored in the application state.
pub type Backend = Arc<dyn Store>;

/// A column that must be unique across users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unique {
	Email,
	Username,
}

impl fmt::Display for Unique {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Email => "email",
			Self::Username => "username",
		})
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	#[error("{0} already taken")]
	Conflict(Unique),
}

/// A user that has not been stored yet. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
	pub id: Uuid,
	pub email: String,
	pub username: String,
	pub password: Vec<u8>,
}

#[axum::async_trait]
pub trait Store: Send + Sync {
	/// Stores a new user along with their first session.
	async fn register(&self, user: NewUser) -> Result<Session, Error>;

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error>;

	async fn create_session(&self, user_id: Uuid) -> Result<Session, Error>;

	/// Resolves a session id to the user that owns it.
	async fn find_session_user(&self, session_id: Uuid) -> Result<Option<User>, Error>;

	async fn delete_session(&self, session_id: Uuid) -> Result<(), Error>;

	/// Every post joined with its author's username, newest first.
	async fn list_posts(&self) -> Result<Vec<AuthoredPost>, Error>;

	async fn find_post(&self, id: Uuid) -> Result<Option<Post>, Error>;

	async fn insert_post(&self, author_id: Uuid, draft: &PostDraft) -> Result<Post, Error>;

	/// Replaces the title and content of a post owned by `author_id`,
	/// refreshing its update time.
	///
	/// Returns `None` if no such post exists for that author.
	async fn update_post(
		&self,
		id: Uuid,
		author_id: Uuid,
		draft: &PostDraft,
	) -> Result<Option<Post>, Error>;

	/// Deletes a post owned by `author_id`, returning whether anything was deleted.
	async fn delete_post(&self, id: Uuid, author_id: Uuid) -> Result<bool, Error>;
}
