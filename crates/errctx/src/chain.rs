//! Walking `source()` chains.
//!
//! [`is`] answers "does this error chain contain that error?" by identity,
//! the way callers compare sentinel errors. Plain pointer comparison is not
//! enough once errors are decorated, so every link that is a
//! [`Decorated`] also gets to answer through [`Decorated::is`].

use std::error::Error as StdError;

use crate::decorate::{same_error, Decorated};

/// Iterator over an error and its transitive `source()` links.
#[derive(Clone)]
pub struct Chain<'a> {
    next: Option<&'a (dyn StdError + 'static)>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn StdError + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.source();
        Some(current)
    }
}

/// Iterate `err` followed by each error in its `source()` chain.
pub fn iter<'a>(err: &'a (dyn StdError + 'static)) -> Chain<'a> {
    Chain { next: Some(err) }
}

/// Returns `true` if any link in `err`'s chain is `target`.
///
/// A link matches when it is the same allocation as `target`, or when it is
/// a decorated error whose base is `target` or is also the base of `target`.
pub fn is(err: &(dyn StdError + 'static), target: &(dyn StdError + 'static)) -> bool {
    iter(err).any(|link| {
        same_error(link, target)
            || link
                .downcast_ref::<Decorated>()
                .is_some_and(|decorated| decorated.is(target))
    })
}
