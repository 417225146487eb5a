//! Offset-based pagination helpers
//!
//! The API takes `from`/`size` pairs; storage queries run page-aligned,
//! with `page = from / size`.

use crate::utils::errors::{AfishaError, Result};

/// Convert a `from`/`size` pair into `(limit, offset)` for a SQL query.
///
/// The offset is aligned down to a whole page, matching the paging contract
/// of the listing endpoints.
pub fn page_bounds(from: i64, size: i64) -> Result<(i64, i64)> {
    if from < 0 {
        return Err(AfishaError::Validation(format!(
            "from must not be negative, got {from}"
        )));
    }
    if size <= 0 {
        return Err(AfishaError::Validation(format!(
            "size must be positive, got {size}"
        )));
    }
    let page = from / size;
    Ok((size, page * size))
}
