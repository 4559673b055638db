use std::sync::{
	atomic::{AtomicBool, AtomicUsize, Ordering},
	Mutex, MutexGuard, PoisonError,
};

use chrono::Utc;
use uuid::Uuid;

use super::{Error, NewUser, Store, Unique};
use crate::route::{
	auth::model::{Session, User},
	post::model::{AuthoredPost, Post, PostDraft},
};

#[derive(Default)]
struct Tables {
	users: Vec<User>,
	sessions: Vec<Session>,
	/// Posts in insertion order, which breaks ties between equal timestamps.
	posts: Vec<Post>,
}

/// An in-memory [`Store`] used by tests.
///
/// It can be made unavailable, or read-only for posts, to exercise failure
/// paths. It also counts post writes so tests can assert that nothing
/// reached the store.
#[derive(Default)]
pub struct MemoryStore {
	tables: Mutex<Tables>,
	unavailable: AtomicBool,
	read_only: AtomicBool,
	post_writes: AtomicUsize,
}

impl MemoryStore {
	/// Makes every following operation fail like a dropped connection would.
	pub fn set_unavailable(&self, unavailable: bool) {
		self.unavailable.store(unavailable, Ordering::SeqCst);
	}

	/// Makes post writes fail while reads and sessions keep working.
	pub fn set_read_only(&self, read_only: bool) {
		self.read_only.store(read_only, Ordering::SeqCst);
	}

	/// The number of insert, update and delete calls made for posts.
	pub fn post_writes(&self) -> usize {
		self.post_writes.load(Ordering::SeqCst)
	}

	fn tables(&self) -> Result<MutexGuard<'_, Tables>, Error> {
		if self.unavailable.load(Ordering::SeqCst) {
			return Err(Error::Database(sqlx::Error::PoolTimedOut));
		}

		Ok(self.tables.lock().unwrap_or_else(PoisonError::into_inner))
	}

	fn write_post(&self) -> Result<MutexGuard<'_, Tables>, Error> {
		self.post_writes.fetch_add(1, Ordering::SeqCst);

		if self.read_only.load(Ordering::SeqCst) {
			return Err(Error::Database(sqlx::Error::PoolClosed));
		}

		self.tables()
	}
}

#[axum::async_trait]
impl Store for MemoryStore {
	async fn register(&self, user: NewUser) -> Result<Session, Error> {
		let mut tables = self.tables()?;

		if tables.users.iter().any(|u| u.email == user.email) {
			return Err(Error::Conflict(Unique::Email));
		}

		if tables.users.iter().any(|u| u.username == user.username) {
			return Err(Error::Conflict(Unique::Username));
		}

		let now = Utc::now();
		let session = Session {
			id: Uuid::new_v4(),
			user_id: user.id,
			created_at: now,
		};

		tables.users.push(User {
			id: user.id,
			email: user.email,
			password: user.password,
			username: user.username,
			created_at: now,
		});
		tables.sessions.push(session.clone());

		Ok(session)
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
		let tables = self.tables()?;

		Ok(tables.users.iter().find(|u| u.email == email).cloned())
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Session, Error> {
		let mut tables = self.tables()?;
		let session = Session {
			id: Uuid::new_v4(),
			user_id,
			created_at: Utc::now(),
		};

		tables.sessions.push(session.clone());

		Ok(session)
	}

	async fn find_session_user(&self, session_id: Uuid) -> Result<Option<User>, Error> {
		let tables = self.tables()?;
		let user = tables
			.sessions
			.iter()
			.find(|s| s.id == session_id)
			.and_then(|s| tables.users.iter().find(|u| u.id == s.user_id))
			.cloned();

		Ok(user)
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<(), Error> {
		self.tables()?.sessions.retain(|s| s.id != session_id);

		Ok(())
	}

	async fn list_posts(&self) -> Result<Vec<AuthoredPost>, Error> {
		let tables = self.tables()?;
		let mut posts = tables
			.posts
			.iter()
			.enumerate()
			.filter_map(|(seq, post)| {
				let author = tables.users.iter().find(|u| u.id == post.author_id)?;

				Some((
					seq,
					AuthoredPost {
						post: post.clone(),
						username: author.username.clone(),
					},
				))
			})
			.collect::<Vec<_>>();

		posts.sort_by(|(a_seq, a), (b_seq, b)| {
			b.post
				.created_at
				.cmp(&a.post.created_at)
				.then(b_seq.cmp(a_seq))
		});

		Ok(posts.into_iter().map(|(_, post)| post).collect())
	}

	async fn find_post(&self, id: Uuid) -> Result<Option<Post>, Error> {
		let tables = self.tables()?;

		Ok(tables.posts.iter().find(|p| p.id == id).cloned())
	}

	async fn insert_post(&self, author_id: Uuid, draft: &PostDraft) -> Result<Post, Error> {
		let mut tables = self.write_post()?;
		let now = Utc::now();
		let post = Post {
			id: Uuid::new_v4(),
			author_id,
			title: draft.title().to_owned(),
			content: draft.content().to_owned(),
			created_at: now,
			updated_at: now,
		};

		tables.posts.push(post.clone());

		Ok(post)
	}

	async fn update_post(
		&self,
		id: Uuid,
		author_id: Uuid,
		draft: &PostDraft,
	) -> Result<Option<Post>, Error> {
		let mut tables = self.write_post()?;
		let Some(post) = tables
			.posts
			.iter_mut()
			.find(|p| p.id == id && p.author_id == author_id)
		else {
			return Ok(None);
		};

		draft.title().clone_into(&mut post.title);
		draft.content().clone_into(&mut post.content);
		post.updated_at = Utc::now();

		Ok(Some(post.clone()))
	}

	async fn delete_post(&self, id: Uuid, author_id: Uuid) -> Result<bool, Error> {
		let mut tables = self.write_post()?;
		let before = tables.posts.len();

		tables
			.posts
			.retain(|p| !(p.id == id && p.author_id == author_id));

		Ok(tables.posts.len() < before)
	}
}
