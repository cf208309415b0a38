//! Path hierarchy used to credit traffic to sections
//!
//! Every event credits the root section once, plus the full request path and
//! each prefix reached by repeatedly cutting the path at its last `/`:
//!
//! ```
//! use logwatch_rs::aggregation::sections;
//!
//! let credited: Vec<&str> = sections("/api/post/create").collect();
//! assert_eq!(credited, vec!["/api/post/create", "/api/post", "/api"]);
//! ```
//!
//! The root itself is not yielded by [`sections`]; callers credit
//! [`ROOT_SECTION`] separately so it is incremented exactly once per event.

/// Key of the root section, credited once for every event
pub const ROOT_SECTION: &str = "/";

/// Iterate the non-root sections credited for `path`, longest first
///
/// Paths that are blank, exactly `/`, or contain no `/` at all yield nothing
/// (the event only counts toward the root). A prefix without a `/` ends the
/// chain, so `api/user` yields only `api/user`.
pub fn sections(path: &str) -> Sections<'_> {
    Sections {
        remaining: Some(path),
    }
}

/// Iterator returned by [`sections`]
#[derive(Debug, Clone)]
pub struct Sections<'a> {
    remaining: Option<&'a str>,
}

impl<'a> Iterator for Sections<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let current = self.remaining.take()?;
        if current.trim().is_empty() || current == ROOT_SECTION {
            return None;
        }
        let cut = current.rfind('/')?;
        self.remaining = Some(&current[..cut]);
        Some(current)
    }
}
