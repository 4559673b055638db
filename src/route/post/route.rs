use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Path, Session},
	openapi::tag,
	store::Backend,
};

use super::{
	model::{self, IdInput},
	Error, RouteError,
};

/// Get all posts
/// Returns every post along with its author's username, newest first.
#[route(tag = tag::POST)]
pub async fn get_posts(
	State(store): State<Backend>,
) -> Result<Json<Vec<model::AuthoredPost>>, RouteError> {
	Ok(Json(store.list_posts().await?))
}

/// Get single post
/// Returns a single post by its unique id.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(store): State<Backend>,
	Path(path): Path<IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	let post = store.find_post(path.id).await?;

	Ok(Json(post.ok_or(Error::UnknownPost(path.id))?))
}

/// Create post
/// Creates a new post authored by the authenticated user. The title and content are trimmed.
#[route(tag = tag::POST)]
pub async fn create_post(
	State(store): State<Backend>,
	session: Session,
	Json(input): Json<model::PostInput>,
) -> Result<Json<model::Post>, RouteError> {
	let draft = model::PostDraft::try_from(&input).map_err(Error::Draft)?;
	let post = store.insert_post(session.user.id, &draft).await?;

	Ok(Json(post))
}

/// Update post
/// Replaces the title and content of one of your posts, refreshing its update time.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(store): State<Backend>,
	session: Session,
	Path(path): Path<IdInput>,
	Json(input): Json<model::PostInput>,
) -> Result<Json<model::Post>, RouteError> {
	let draft = model::PostDraft::try_from(&input).map_err(Error::Draft)?;
	let post = store.update_post(path.id, session.user.id, &draft).await?;

	Ok(Json(post.ok_or(Error::UnknownPost(path.id))?))
}

/// Delete post
/// Deletes one of your posts by its unique id.
#[route(tag = tag::POST)]
pub async fn delete_post(
	State(store): State<Backend>,
	session: Session,
	Path(path): Path<IdInput>,
) -> Result<(), RouteError> {
	if !store.delete_post(path.id, session.user.id).await? {
		return Err(Error::UnknownPost(path.id).into());
	}

	Ok(())
}
