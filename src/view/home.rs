use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{redirect, resolve, Viewer, HOME, LOGIN};
use crate::{
	error::AppError, extract::MaybeSession, route::post::model::AuthoredPost, AppState,
};

const LOAD_FAILED: &str = "Could not load posts. Please try again.";
const DELETE_FAILED: &str = "Failed to delete post. Please try again.";

/// Which post, if any, is showing the delete confirmation banner.
///
/// Only one post can be armed at a time; arming another one replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteConfirm {
	#[default]
	Idle,
	Armed(Uuid),
}

impl DeleteConfirm {
	/// Reads the `confirm` query parameter. Anything that is not a post id is ignored.
	pub fn from_param(param: Option<&str>) -> Self {
		param
			.and_then(|id| Uuid::parse_str(id).ok())
			.map_or(Self::Idle, Self::Armed)
	}

	pub fn is_armed_for(self, id: Uuid) -> bool {
		self == Self::Armed(id)
	}
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
	confirm: Option<String>,
}

/// A post as rendered in the list.
#[derive(Debug, Serialize)]
struct PostCard {
	id: Uuid,
	title: String,
	username: String,
	date: String,
	content: String,
	/// Whether the viewer wrote the post, which shows the edit and delete controls.
	owned: bool,
	confirming: bool,
}

#[derive(Serialize)]
struct Page<'a> {
	viewer: Option<Viewer>,
	posts: Vec<PostCard>,
	notice: Option<&'a str>,
}

/// Formats a timestamp like "March 4, 2024 at 09:05 PM".
pub fn format_date(date: DateTime<Utc>) -> String {
	date.format("%B %-d, %Y at %I:%M %p").to_string()
}

fn cards(posts: Vec<AuthoredPost>, viewer: Option<Uuid>, confirm: DeleteConfirm) -> Vec<PostCard> {
	posts
		.into_iter()
		.map(|AuthoredPost { post, username }| {
			let owned = viewer == Some(post.author_id);

			PostCard {
				id: post.id,
				date: format_date(post.created_at),
				confirming: owned && confirm.is_armed_for(post.id),
				owned,
				title: post.title,
				username,
				content: post.content,
			}
		})
		.collect()
}

async fn render(
	state: &AppState,
	session: &MaybeSession,
	confirm: DeleteConfirm,
	notice: Option<&str>,
) -> Result<Response, AppError> {
	let (posts, notice) = match state.store.list_posts().await {
		Ok(posts) => (posts, notice),
		Err(error) => {
			tracing::error!(%error, "failed to fetch posts");

			(Vec::new(), notice.or(Some(LOAD_FAILED)))
		}
	};

	state.templates.render(
		"home.html",
		StatusCode::OK,
		Page {
			viewer: Viewer::of(session),
			posts: cards(posts, session.user_id(), confirm),
			notice,
		},
	)
}

/// Lists every post, newest first.
pub async fn list(
	State(state): State<AppState>,
	session: Result<MaybeSession, AppError>,
	Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
	let confirm = DeleteConfirm::from_param(query.confirm.as_deref());

	match resolve(session) {
		Some(session) => render(&state, &session, confirm, None).await,
		None => render(&state, &MaybeSession(None), DeleteConfirm::Idle, Some(LOAD_FAILED)).await,
	}
}

/// Deletes one of the viewer's posts, then sends them back to the refreshed list.
pub async fn delete(
	State(state): State<AppState>,
	session: Result<MaybeSession, AppError>,
	Path(id): Path<String>,
) -> Result<Response, AppError> {
	let Some(session) = resolve(session) else {
		let notice = Some(DELETE_FAILED);

		return render(&state, &MaybeSession(None), DeleteConfirm::Idle, notice).await;
	};

	let Some(user) = session.0.as_ref().map(|session| &session.user) else {
		return Ok(redirect(LOGIN));
	};

	let Ok(id) = Uuid::parse_str(&id) else {
		return Ok(redirect(HOME));
	};

	match state.store.delete_post(id, user.id).await {
		Ok(true) => {
			tracing::info!(post = %id, user = %user.id, "deleted post");

			Ok(redirect(HOME))
		}
		Ok(false) => {
			tracing::warn!(post = %id, user = %user.id, "no post to delete for this author");

			Ok(redirect(HOME))
		}
		Err(error) => {
			tracing::error!(%error, post = %id, "failed to delete post");

			render(&state, &session, DeleteConfirm::Armed(id), Some(DELETE_FAILED)).await
		}
	}
}

#[cfg(test)]
mod test {
	use chrono::TimeZone;

	use super::*;
	use crate::route::post::model::Post;
	use crate::test::*;

	fn authored(author_id: Uuid, title: &str) -> AuthoredPost {
		let now = Utc::now();

		AuthoredPost {
			post: Post {
				id: Uuid::new_v4(),
				author_id,
				title: title.into(),
				content: "content".into(),
				created_at: now,
				updated_at: now,
			},
			username: "someone".into(),
		}
	}

	#[test]
	fn test_format_date() {
		let date = Utc.with_ymd_and_hms(2024, 3, 4, 21, 5, 0).unwrap();

		assert_eq!(format_date(date), "March 4, 2024 at 09:05 PM");
	}

	#[test]
	fn test_confirm_param() {
		let id = Uuid::new_v4();

		assert_eq!(DeleteConfirm::from_param(None), DeleteConfirm::Idle);
		assert_eq!(DeleteConfirm::from_param(Some("nope")), DeleteConfirm::Idle);
		assert_eq!(
			DeleteConfirm::from_param(Some(&id.to_string())),
			DeleteConfirm::Armed(id)
		);
		assert!(DeleteConfirm::Armed(id).is_armed_for(id));
		assert!(!DeleteConfirm::Armed(id).is_armed_for(Uuid::new_v4()));
		assert!(!DeleteConfirm::Idle.is_armed_for(id));
	}

	#[test]
	fn test_controls_only_for_the_author() {
		let alice = Uuid::new_v4();
		let bob = Uuid::new_v4();
		let posts = vec![authored(alice, "a"), authored(bob, "b")];

		let as_alice = cards(posts.clone(), Some(alice), DeleteConfirm::Idle);

		assert!(as_alice[0].owned);
		assert!(!as_alice[1].owned);

		let anonymous = cards(posts, None, DeleteConfirm::Idle);

		assert!(anonymous.iter().all(|card| !card.owned));
	}

	#[test]
	fn test_confirmation_needs_ownership() {
		let alice = Uuid::new_v4();
		let bob = Uuid::new_v4();
		let posts = vec![authored(alice, "a"), authored(bob, "b")];
		let foreign = posts[1].post.id;
		let own = posts[0].post.id;

		let as_alice = cards(posts.clone(), Some(alice), DeleteConfirm::Armed(foreign));

		assert!(as_alice.iter().all(|card| !card.confirming));

		let as_alice = cards(posts, Some(alice), DeleteConfirm::Armed(own));

		assert!(as_alice[0].confirming);
		assert!(!as_alice[1].confirming);
	}

	#[tokio::test]
	async fn test_empty_state_depends_on_session() {
		let app = server(store());

		let html = app.get("/").await.text();

		assert!(html.contains("No posts yet"));
		assert!(html.contains("Sign in to start posting!"));

		register(&app, "alice").await;

		let html = app.get("/").await.text();

		assert!(html.contains("Be the first to create a post!"));
		assert!(html.contains("Create New Post"));
	}

	#[tokio::test]
	async fn test_posts_render_newest_first() {
		let app = server(store());

		register(&app, "alice").await;
		create_post(&app, "First", "one").await;
		create_post(&app, "Second", "two").await;
		create_post(&app, "Third", "three").await;

		let html = app.get("/").await.text();
		let third = html.find("Third").unwrap();
		let second = html.find("Second").unwrap();
		let first = html.find("First").unwrap();

		assert!(third < second && second < first);
	}

	#[tokio::test]
	async fn test_fetch_failure_falls_back_to_an_empty_list() {
		let store = store();
		let app = server(store.clone());

		store.set_unavailable(true);

		let response = app.get("/").await;

		assert_eq!(response.status_code(), 200);

		let html = response.text();

		assert!(html.contains("No posts yet"));
		assert!(html.contains(LOAD_FAILED));
	}

	#[tokio::test]
	async fn test_signed_in_viewer_sees_the_notice_when_the_store_is_down() {
		let store = store();
		let app = server(store.clone());

		register(&app, "alice").await;
		create_post(&app, "Unreachable", "for now").await;

		let id = post_ids(&store).await[0];

		store.set_unavailable(true);

		let response = app.get("/").await;

		assert_eq!(response.status_code(), 200);

		let html = response.text();

		assert!(html.contains("<nav"));
		assert!(html.contains("No posts yet"));
		assert!(html.contains(LOAD_FAILED));

		let response = app.post(&format!("/posts/{id}/delete")).await;

		assert_eq!(response.status_code(), 200);
		assert!(response.text().contains(DELETE_FAILED));

		store.set_unavailable(false);

		assert_eq!(post_ids(&store).await, vec![id]);
	}

	#[tokio::test]
	async fn test_delete_takes_two_steps() {
		let store = store();
		let app = server(store.clone());

		register(&app, "alice").await;
		create_post(&app, "Doomed", "soon gone").await;

		let id = post_ids(&store).await[0];

		// the first click only arms the confirmation
		let html = app.get(&format!("/?confirm={id}")).await.text();

		assert!(html.contains("Are you sure you want to delete this post?"));
		assert!(html.contains(&format!("/posts/{id}/delete")));
		assert_eq!(post_ids(&store).await.len(), 1);

		// the second one deletes
		let response = app.post(&format!("/posts/{id}/delete")).await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/");
		assert!(post_ids(&store).await.is_empty());
	}

	#[tokio::test]
	async fn test_only_the_author_can_delete() {
		let store = store();
		let alice = server(store.clone());

		register(&alice, "alice").await;
		create_post(&alice, "Mine", "hands off").await;

		let id = post_ids(&store).await[0];
		let mallory = server(store.clone());

		register(&mallory, "mallory").await;

		let html = mallory.get(&format!("/?confirm={id}")).await.text();

		assert!(!html.contains("Are you sure"));
		assert!(!html.contains(&format!("/edit-post/{id}")));

		let response = mallory.post(&format!("/posts/{id}/delete")).await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(post_ids(&store).await.len(), 1);

		// signed out
		let anonymous = server(store.clone());
		let response = anonymous.post(&format!("/posts/{id}/delete")).await;

		assert_eq!(response.header("location"), "/login");
		assert_eq!(post_ids(&store).await.len(), 1);
	}

	#[tokio::test]
	async fn test_delete_failure_shows_a_notice() {
		let store = store();
		let app = server(store.clone());

		register(&app, "alice").await;
		create_post(&app, "Sticky", "still here").await;

		let id = post_ids(&store).await[0];

		store.set_read_only(true);

		let response = app.post(&format!("/posts/{id}/delete")).await;

		assert_eq!(response.status_code(), 200);

		let html = response.text();

		assert!(html.contains(DELETE_FAILED));
		assert!(html.contains("Sticky"));
		assert_eq!(post_ids(&store).await.len(), 1);
	}

	#[tokio::test]
	async fn test_hello_world_example() {
		let store = store();
		let alice = server(store.clone());

		register(&alice, "alice").await;

		let response = alice
			.post("/create-post")
			.form(&[("title", "Hello"), ("content", "World")])
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/");

		let id = post_ids(&store).await[0];
		let html = alice.get("/").await.text();

		assert_eq!(html.matches("<article").count(), 1);
		assert!(html.contains("<h2>Hello</h2>"));
		assert!(html.contains(r#"<span class="author">alice</span>"#));
		assert!(html.contains(&format!("/edit-post/{id}")));
		assert!(html.contains(&format!("/?confirm={id}")));

		let bob = server(store.clone());

		register(&bob, "bob").await;

		let html = bob.get("/").await.text();

		assert!(html.contains("<h2>Hello</h2>"));
		assert!(!html.contains(&format!("/edit-post/{id}")));
		assert!(!html.contains(&format!("/?confirm={id}")));
	}
}
