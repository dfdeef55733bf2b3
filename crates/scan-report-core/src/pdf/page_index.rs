//! Page index newtype for conversion between zero-based indices and lopdf's
//! one-based page numbers.

use std::fmt;

use crate::error::Error;

/// A zero-based page index validated against a document's page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageIndex(u32);

impl PageIndex {
    /// Get the 1-indexed page number used as the key of `Document::get_pages`.
    #[must_use]
    pub const fn as_lopdf_page_number(self) -> u32 {
        self.0 + 1
    }

    /// Try to create a PageIndex from a zero-based page number.
    ///
    /// Returns an error if the page number exceeds the total page count.
    pub fn try_from_page_num(page_num: usize, total_pages: usize) -> Result<Self, Error> {
        if page_num >= total_pages {
            return Err(Error::PdfInvalidPage {
                page: page_num,
                total: total_pages,
            });
        }

        let index = u32::try_from(page_num).map_err(|_| Error::PdfInvalidPage {
            page: page_num,
            total: total_pages,
        })?;

        Ok(Self(index))
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_page_num_valid() {
        let idx = PageIndex::try_from_page_num(1, 3).unwrap();
        assert_eq!(idx.as_lopdf_page_number(), 2);
    }

    #[test]
    fn test_try_from_page_num_out_of_range() {
        assert!(PageIndex::try_from_page_num(1, 1).is_err());
        assert!(PageIndex::try_from_page_num(0, 0).is_err());
    }

    #[test]
    fn test_display() {
        let idx = PageIndex::try_from_page_num(7, 8).unwrap();
        assert_eq!(format!("{idx}"), "7");
    }
}
