use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Response,
	Form,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{redirect, resolve, Viewer, HOME, LOGIN};
use crate::{
	error::AppError,
	extract::MaybeSession,
	route::post::model::{PostDraft, TITLE_MAX_LENGTH},
	AppState,
};

const CREATE_FAILED: &str = "Failed to create post. Please try again.";
const UPDATE_FAILED: &str = "Failed to update post. Please try again.";
const IN_FLIGHT: &str = "Your previous submission is still being processed.";

/// The fields of the post form, exactly as they were submitted.
#[derive(Debug, Default, Deserialize)]
pub struct PostForm {
	#[serde(default)]
	title: String,
	#[serde(default)]
	content: String,
}

#[derive(Debug, Clone, Copy)]
enum FormKind {
	Create,
	Edit(Uuid),
}

impl FormKind {
	fn heading(self) -> &'static str {
		match self {
			Self::Create => "Create New Post",
			Self::Edit(..) => "Edit Post",
		}
	}

	fn submit_label(self) -> &'static str {
		match self {
			Self::Create => "Create Post",
			Self::Edit(..) => "Update Post",
		}
	}

	fn action(self) -> String {
		match self {
			Self::Create => "/create-post".to_string(),
			Self::Edit(id) => format!("/edit-post/{id}"),
		}
	}
}

#[derive(Serialize)]
struct Page<'a> {
	viewer: Option<Viewer>,
	heading: &'static str,
	action: String,
	submit_label: &'static str,
	title: &'a str,
	content: &'a str,
	title_max_length: usize,
	error: Option<&'a str>,
}

fn render(
	state: &AppState,
	session: &MaybeSession,
	kind: FormKind,
	status: StatusCode,
	form: &PostForm,
	error: Option<&str>,
) -> Result<Response, AppError> {
	state.templates.render(
		"post_form.html",
		status,
		Page {
			viewer: Viewer::of(session),
			heading: kind.heading(),
			action: kind.action(),
			submit_label: kind.submit_label(),
			title: &form.title,
			content: &form.content,
			title_max_length: TITLE_MAX_LENGTH,
			error,
		},
	)
}

pub async fn create_page(
	State(state): State<AppState>,
	session: Result<MaybeSession, AppError>,
) -> Result<Response, AppError> {
	// the list page explains that the store is unreachable
	let Some(session) = resolve(session) else {
		return Ok(redirect(HOME));
	};

	if session.0.is_none() {
		return Ok(redirect(LOGIN));
	}

	render(
		&state,
		&session,
		FormKind::Create,
		StatusCode::OK,
		&PostForm::default(),
		None,
	)
}

/// Creates a post written by the viewer.
pub async fn create(
	State(state): State<AppState>,
	session: Result<MaybeSession, AppError>,
	Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
	let kind = FormKind::Create;
	let Some(session) = resolve(session) else {
		return render(
			&state,
			&MaybeSession(None),
			kind,
			StatusCode::INTERNAL_SERVER_ERROR,
			&form,
			Some(CREATE_FAILED),
		);
	};

	let Some(user_id) = session.user_id() else {
		return Ok(redirect(LOGIN));
	};

	let draft = match PostDraft::new(&form.title, &form.content) {
		Ok(draft) => draft,
		Err(error) => {
			let message = error.to_string();

			return render(
				&state,
				&session,
				kind,
				StatusCode::UNPROCESSABLE_ENTITY,
				&form,
				Some(&message),
			);
		}
	};

	let Some(_guard) = state.submissions.begin(user_id) else {
		return render(&state, &session, kind, StatusCode::CONFLICT, &form, Some(IN_FLIGHT));
	};

	match state.store.insert_post(user_id, &draft).await {
		Ok(post) => {
			tracing::info!(post = %post.id, user = %user_id, "created post");

			Ok(redirect(HOME))
		}
		Err(error) => {
			tracing::error!(%error, user = %user_id, "failed to create post");

			render(
				&state,
				&session,
				kind,
				StatusCode::INTERNAL_SERVER_ERROR,
				&form,
				Some(CREATE_FAILED),
			)
		}
	}
}

/// Shows the edit form, but only to the author of the post.
pub async fn edit_page(
	State(state): State<AppState>,
	session: Result<MaybeSession, AppError>,
	Path(id): Path<String>,
) -> Result<Response, AppError> {
	let Some(session) = resolve(session) else {
		return Ok(redirect(HOME));
	};

	let Ok(id) = Uuid::parse_str(&id) else {
		tracing::warn!(%id, "malformed post id");

		return Ok(redirect(HOME));
	};

	let post = match state.store.find_post(id).await {
		Ok(Some(post)) => post,
		Ok(None) => {
			tracing::warn!(post = %id, "post not found");

			return Ok(redirect(HOME));
		}
		Err(error) => {
			tracing::error!(%error, post = %id, "failed to fetch post");

			return Ok(redirect(HOME));
		}
	};

	if session.user_id() != Some(post.author_id) {
		return Ok(redirect(HOME));
	}

	render(
		&state,
		&session,
		FormKind::Edit(id),
		StatusCode::OK,
		&PostForm {
			title: post.title,
			content: post.content,
		},
		None,
	)
}

/// Replaces the title and content of one of the viewer's posts.
pub async fn edit(
	State(state): State<AppState>,
	session: Result<MaybeSession, AppError>,
	Path(id): Path<String>,
	Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
	let Ok(id) = Uuid::parse_str(&id) else {
		return Ok(redirect(HOME));
	};

	let kind = FormKind::Edit(id);
	let Some(session) = resolve(session) else {
		return render(
			&state,
			&MaybeSession(None),
			kind,
			StatusCode::INTERNAL_SERVER_ERROR,
			&form,
			Some(UPDATE_FAILED),
		);
	};

	let Some(user_id) = session.user_id() else {
		return Ok(redirect(LOGIN));
	};

	let draft = match PostDraft::new(&form.title, &form.content) {
		Ok(draft) => draft,
		Err(error) => {
			let message = error.to_string();

			return render(
				&state,
				&session,
				kind,
				StatusCode::UNPROCESSABLE_ENTITY,
				&form,
				Some(&message),
			);
		}
	};

	let Some(_guard) = state.submissions.begin(user_id) else {
		return render(&state, &session, kind, StatusCode::CONFLICT, &form, Some(IN_FLIGHT));
	};

	let status = match state.store.update_post(id, user_id, &draft).await {
		Ok(Some(post)) => {
			tracing::info!(post = %post.id, user = %user_id, "updated post");

			return Ok(redirect(HOME));
		}
		Ok(None) => {
			tracing::warn!(post = %id, user = %user_id, "no post to update for this author");

			StatusCode::NOT_FOUND
		}
		Err(error) => {
			tracing::error!(%error, post = %id, "failed to update post");

			StatusCode::INTERNAL_SERVER_ERROR
		}
	};

	render(&state, &session, kind, status, &form, Some(UPDATE_FAILED))
}
