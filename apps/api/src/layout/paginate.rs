//! Splits records into page-sized batches, preserving input order.

use crate::layout::LayoutError;

/// Borrows `items` as consecutive batches of `slots_per_page`; the last batch holds
/// the remainder. Empty input yields no pages.
pub fn paginate<T>(items: &[T], slots_per_page: usize) -> Result<Vec<&[T]>, LayoutError> {
    if slots_per_page == 0 {
        return Err(LayoutError::ZeroSlots);
    }
    Ok(items.chunks(slots_per_page).collect())
}

/// Number of pages `paginate` produces for `item_count` items.
pub fn page_count(item_count: usize, slots_per_page: usize) -> usize {
    if slots_per_page == 0 {
        return 0;
    }
    item_count.div_ceil(slots_per_page)
}
