//! Source locations recorded by [`mark`](crate::mark()).
//!
//! Locations are captured two ways. `#[track_caller]` covers the common case
//! (the caller of a public entry point) at zero cost and works in every
//! build profile. Explicit non-zero skip counts need a real stack walk, which
//! is done with the `backtrace` crate when the `backtrace` feature is on and
//! requires debug info to resolve file and line.

use std::fmt;
use std::panic::Location;

/// A `file:line` pair with the directory components stripped from `file`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSite {
    file: String,
    line: u32,
}

impl CallSite {
    /// Build a call site from any path; only the final component is kept.
    pub fn new(path: &str, line: u32) -> Self {
        Self {
            file: file_name(path).to_string(),
            line,
        }
    }

    pub fn from_location(location: &Location<'_>) -> Self {
        Self::new(location.file(), location.line())
    }

    /// The call site of whoever called the `#[track_caller]` chain that ends
    /// here.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Final path component, accepting either separator.
fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Resolve the call site `skip` frames above the caller of the function that
/// called `resolve`.
///
/// Frame layout seen from here: `resolve`, then its caller (the marking
/// entry point), then the entry point's caller (`skip == 0`), and so on.
/// Inlined frames count as frames. Only frames up to the target are
/// symbolized. Returns `None` if the stack cannot be walked or the target
/// frame has no line information.
#[cfg(feature = "backtrace")]
#[inline(never)]
pub(crate) fn resolve(skip: usize) -> Option<CallSite> {
    let mut anchor: Option<usize> = None;
    let mut seen = 0usize;
    let mut target: Option<Option<CallSite>> = None;

    backtrace::trace(|frame| {
        backtrace::resolve_frame(frame, |symbol| {
            if target.is_some() {
                return;
            }
            match anchor {
                None => {
                    if symbol
                        .name()
                        .is_some_and(|name| format!("{name:#}").ends_with("site::resolve"))
                    {
                        anchor = Some(seen);
                    }
                }
                Some(at) if seen == at + 2 + skip => {
                    target = Some(
                        symbol
                            .filename()
                            .zip(symbol.lineno())
                            .map(|(path, line)| CallSite::new(&path.to_string_lossy(), line)),
                    );
                }
                Some(_) => {}
            }
            seen += 1;
        });
        target.is_none()
    });

    target.flatten()
}

#[cfg(not(feature = "backtrace"))]
pub(crate) fn resolve(_skip: usize) -> Option<CallSite> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_unix_directories() {
        let site = CallSite::new("/home/dev/project/src/handler.rs", 42);
        assert_eq!(site.file(), "handler.rs");
        assert_eq!(site.line(), 42);
        assert_eq!(site.to_string(), "handler.rs:42");
    }

    #[test]
    fn strips_windows_directories() {
        let site = CallSite::new(r"C:\work\src\handler.rs", 7);
        assert_eq!(site.to_string(), "handler.rs:7");
    }

    #[test]
    fn bare_file_name_is_kept() {
        assert_eq!(CallSite::new("main.rs", 1).to_string(), "main.rs:1");
    }

    #[test]
    fn caller_reports_this_file() {
        let (site, line) = (CallSite::caller(), line!());
        assert_eq!(site.file(), "site.rs");
        assert_eq!(site.line(), line);
    }

    #[cfg(feature = "backtrace")]
    #[inline(never)]
    fn resolve_from_here(skip: usize) -> Option<CallSite> {
        resolve(skip)
    }

    #[cfg(feature = "backtrace")]
    #[test]
    fn resolve_counts_frames_above_the_entry_point() {
        let (site, line) = (resolve_from_here(0), line!());
        let site = site.expect("stack should be resolvable in test builds");
        assert_eq!(site.to_string(), format!("site.rs:{line}"));
    }

    #[cfg(feature = "backtrace")]
    #[test]
    fn resolve_past_the_stack_top_is_none() {
        assert!(resolve_from_here(100_000).is_none());
    }
}
