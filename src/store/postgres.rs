use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::{Error, NewUser, Store, Unique};
use crate::route::{
	auth::model::{Session, User},
	post::model::{AuthoredPost, Post, PostDraft},
};

/// A [`Store`] backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
	pool: PgPool,
}

impl PgStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	pub async fn connect(url: &str) -> Result<Self, Error> {
		let pool = PgPoolOptions::new().connect(url).await?;

		Ok(Self::new(pool))
	}

	/// Applies the embedded migrations in `migrations/`.
	pub async fn migrate(&self) -> Result<(), Error> {
		sqlx::migrate!().run(&self.pool).await?;

		Ok(())
	}
}

/// Maps unique constraint violations on the user table to [`Error::Conflict`].
fn user_conflict(error: sqlx::Error) -> Error {
	if let sqlx::Error::Database(ref database) = error {
		match database.constraint() {
			Some("user_email_key") => return Error::Conflict(Unique::Email),
			Some("user_username_key") => return Error::Conflict(Unique::Username),
			_ => {}
		}
	}

	Error::Database(error)
}

#[axum::async_trait]
impl Store for PgStore {
	async fn register(&self, user: NewUser) -> Result<Session, Error> {
		let mut tx = self.pool.begin().await?;

		sqlx::query(
			r#"
				INSERT INTO "user" (id, email, username, password) VALUES ($1, $2, $3, $4)
			"#,
		)
		.bind(user.id)
		.bind(&user.email)
		.bind(&user.username)
		.bind(&user.password)
		.execute(&mut *tx)
		.await
		.map_err(user_conflict)?;

		let session = sqlx::query_as::<_, Session>(
			r#"
				INSERT INTO session (user_id) VALUES ($1) RETURNING *
			"#,
		)
		.bind(user.id)
		.fetch_one(&mut *tx)
		.await?;

		tx.commit().await?;

		Ok(session)
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
		let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE email = $1"#)
			.bind(email)
			.fetch_optional(&self.pool)
			.await?;

		Ok(user)
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Session, Error> {
		let session =
			sqlx::query_as::<_, Session>("INSERT INTO session (user_id) VALUES ($1) RETURNING *")
				.bind(user_id)
				.fetch_one(&self.pool)
				.await?;

		Ok(session)
	}

	async fn find_session_user(&self, session_id: Uuid) -> Result<Option<User>, Error> {
		let user = sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM session WHERE id = $1
				)
			"#,
		)
		.bind(session_id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(user)
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<(), Error> {
		sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(session_id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	async fn list_posts(&self) -> Result<Vec<AuthoredPost>, Error> {
		let posts = sqlx::query_as::<_, AuthoredPost>(
			r#"
				SELECT post.*, "user".username FROM post
				JOIN "user" ON "user".id = post.author_id
				ORDER BY post.created_at DESC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		Ok(posts)
	}

	async fn find_post(&self, id: Uuid) -> Result<Option<Post>, Error> {
		let post = sqlx::query_as::<_, Post>("SELECT * FROM post WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(post)
	}

	async fn insert_post(&self, author_id: Uuid, draft: &PostDraft) -> Result<Post, Error> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO post (author_id, title, content)
				VALUES ($1, $2, $3)
				RETURNING *
			"#,
		)
		.bind(author_id)
		.bind(draft.title())
		.bind(draft.content())
		.fetch_one(&self.pool)
		.await?;

		Ok(post)
	}

	async fn update_post(
		&self,
		id: Uuid,
		author_id: Uuid,
		draft: &PostDraft,
	) -> Result<Option<Post>, Error> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				UPDATE post
				SET title = $1, content = $2, updated_at = now()
				WHERE id = $3 AND author_id = $4
				RETURNING *
			"#,
		)
		.bind(draft.title())
		.bind(draft.content())
		.bind(id)
		.bind(author_id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(post)
	}

	async fn delete_post(&self, id: Uuid, author_id: Uuid) -> Result<bool, Error> {
		let status = sqlx::query("DELETE FROM post WHERE id = $1 AND author_id = $2")
			.bind(id)
			.bind(author_id)
			.execute(&self.pool)
			.await?;

		Ok(status.rows_affected() > 0)
	}
}
