use std::{
	collections::HashSet,
	sync::{Arc, Mutex, PoisonError},
};

use uuid::Uuid;

/// Tracks which users have a form submission in flight.
///
/// A user may only have one outstanding create or edit at a time, so a
/// double-clicked submit button cannot insert the same post twice.
#[derive(Debug, Clone, Default)]
pub struct Submissions {
	active: Arc<Mutex<HashSet<Uuid>>>,
}

impl Submissions {
	/// Claims the submission slot for `user_id`, or returns `None` if a
	/// submission is already in flight. The slot is released when the
	/// returned guard is dropped.
	pub fn begin(&self, user_id: Uuid) -> Option<SubmissionGuard> {
		let inserted = self
			.active
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(user_id);

		inserted.then(|| SubmissionGuard {
			active: Arc::clone(&self.active),
			user_id,
		})
	}
}

#[derive(Debug)]
#[must_use = "the submission slot is released as soon as the guard is dropped"]
pub struct SubmissionGuard {
	active: Arc<Mutex<HashSet<Uuid>>>,
	user_id: Uuid,
}

impl Drop for SubmissionGuard {
	fn drop(&mut self) {
		self.active
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.remove(&self.user_id);
	}
}
