//! Splitting of variant sequences into size-bounded groups.

use crate::error::{Error, Result};

/// Number of variants per remote query if nothing else is configured.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Split `items` into consecutive batches of `size` items, or [`DEFAULT_BATCH_SIZE`] if `size`
/// is `None`.
///
/// Order is preserved within and across batches; only the last batch may be shorter.
///
/// # Errors
///
/// Returns `Error::Config` if `size` is zero.
pub fn batch<T>(items: &[T], size: Option<usize>) -> Result<std::slice::Chunks<'_, T>> {
    let size = size.unwrap_or(DEFAULT_BATCH_SIZE);
    if size == 0 {
        return Err(Error::config("batch size must be at least 1"));
    }
    Ok(items.chunks(size))
}
