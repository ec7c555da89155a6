//! Ownership check shared by every owned resource.

use cardvault_storage::Record;

use crate::error::OwnershipError;

/// Pass `record` through only if it exists and `caller_id` owns it.
///
/// Each service decides how the two failure cases surface to callers.
///
/// # Errors
///
/// - [`OwnershipError::Missing`] if `record` is `None`.
/// - [`OwnershipError::NotOwner`] if the record's author is someone else.
pub fn ensure_owner<R: Record>(record: Option<R>, caller_id: i64) -> Result<R, OwnershipError> {
    let record = record.ok_or(OwnershipError::Missing)?;
    if record.author_id() != caller_id {
        return Err(OwnershipError::NotOwner);
    }
    Ok(record)
}
