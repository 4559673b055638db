use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const TITLE_MAX_LENGTH: usize = 100;

fn validate_title(title: &str) -> Result<(), ValidationError> {
	PostDraft::check_title(title).map_err(DraftError::into_validation)
}

fn validate_content(content: &str) -> Result<(), ValidationError> {
	PostDraft::check_content(content).map_err(DraftError::into_validation)
}

/// A single post, created by a user.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The user that created the post. This never changes.
	#[serde(skip_deserializing)]
	pub author_id: Uuid,
	/// The title of the post, at most 100 characters.
	#[validate(custom(function = "validate_title"))]
	pub title: String,
	/// The content of the post.
	#[validate(custom(function = "validate_content"))]
	pub content: String,
	/// The creation time of the post.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
	/// The last time the title or content changed.
	#[serde(skip_deserializing)]
	pub updated_at: DateTime<Utc>,
}

/// The path of a single post.
#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	/// The unique identifier of the post.
	pub id: Uuid,
}

/// A post along with the username of its author.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct AuthoredPost {
	#[serde(flatten)]
	#[sqlx(flatten)]
	pub post: Post,
	/// The username of the author.
	pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
	#[error("Title and content are required")]
	Missing,
	#[error("Title must be at most 100 characters")]
	TitleTooLong,
}

impl DraftError {
	fn code(self) -> &'static str {
		match self {
			Self::Missing => "required",
			Self::TitleTooLong => "too_long",
		}
	}

	fn into_validation(self) -> ValidationError {
		let mut error = ValidationError::new(self.code());

		error.message = Some(self.to_string().into());
		error
	}
}

/// The trimmed title and content of a post that passed validation.
///
/// This is the only thing the store accepts when writing a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
	title: String,
	content: String,
}

impl PostDraft {
	pub fn new(title: &str, content: &str) -> Result<Self, DraftError> {
		Self::check_content(content)?;
		Self::check_title(title)?;

		Ok(Self {
			title: title.trim().to_owned(),
			content: content.trim().to_owned(),
		})
	}

	fn check_title(title: &str) -> Result<(), DraftError> {
		let title = title.trim();

		if title.is_empty() {
			return Err(DraftError::Missing);
		}

		if title.chars().count() > TITLE_MAX_LENGTH {
			return Err(DraftError::TitleTooLong);
		}

		Ok(())
	}

	fn check_content(content: &str) -> Result<(), DraftError> {
		if content.trim().is_empty() {
			return Err(DraftError::Missing);
		}

		Ok(())
	}

	pub fn title(&self) -> &str {
		&self.title
	}

	pub fn content(&self) -> &str {
		&self.content
	}
}

impl TryFrom<&PostInput> for PostDraft {
	type Error = DraftError;

	fn try_from(input: &PostInput) -> Result<Self, Self::Error> {
		Self::new(&input.title, &input.content)
	}
}

#[cfg(test)]
mod test {
	use validator::Validate;

	use super::*;

	#[test]
	fn test_draft_trims_fields() {
		let draft = PostDraft::new("  Hello ", "\n World\t").unwrap();

		assert_eq!(draft.title(), "Hello");
		assert_eq!(draft.content(), "World");
	}

	#[test]
	fn test_draft_requires_both_fields() {
		assert_eq!(PostDraft::new("", "World"), Err(DraftError::Missing));
		assert_eq!(PostDraft::new("Hello", "   "), Err(DraftError::Missing));
		assert_eq!(PostDraft::new(" \t ", "\n"), Err(DraftError::Missing));
	}

	#[test]
	fn test_draft_title_length_counts_characters() {
		let title = "é".repeat(TITLE_MAX_LENGTH);

		assert!(PostDraft::new(&title, "content").is_ok());

		let title = "a".repeat(TITLE_MAX_LENGTH + 1);

		assert_eq!(
			PostDraft::new(&title, "content"),
			Err(DraftError::TitleTooLong)
		);

		// surrounding whitespace does not count
		let title = format!("  {}  ", "a".repeat(TITLE_MAX_LENGTH));

		assert!(PostDraft::new(&title, "content").is_ok());
	}

	#[test]
	fn test_input_validation_matches_draft() {
		let input = PostInput {
			title: "   ".into(),
			content: "World".into(),
		};

		let errors = input.validate().unwrap_err();

		assert!(errors.field_errors().contains_key("title"));
		assert!(PostDraft::try_from(&input).is_err());

		let input = PostInput {
			title: "Hello".into(),
			content: "World".into(),
		};

		assert!(input.validate().is_ok());
		assert!(PostDraft::try_from(&input).is_ok());
	}
}
