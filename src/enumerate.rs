use std::{fmt, io};

/// Whether an error returned by an enumeration ioctl marks the end of the list
///
/// Drivers answer an index past the last entry with `EINVAL`. Every other error is a real
/// failure, even though the enumeration has to stop there as well.
pub fn is_end_of_enumeration(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::InvalidInput
}

/// Lazy sequence of driver records, fetched one index at a time
///
/// The sequence yields `Ok` items until the driver signals the end of the list, which simply
/// ends the iteration. Any other error is yielded once and ends the iteration too, so callers can
/// tell an exhausted list from a truncated one. Ask the [`crate::Driver`] for a fresh instance to
/// start over.
pub struct Enumeration<'a, T> {
    query: Box<dyn FnMut(u32) -> io::Result<T> + 'a>,
    index: u32,
    done: bool,
}

impl<'a, T> Enumeration<'a, T> {
    /// Builds an enumeration from a per-index query, starting at index 0
    pub fn new<F>(query: F) -> Self
    where
        F: FnMut(u32) -> io::Result<T> + 'a,
    {
        Enumeration {
            query: Box::new(query),
            index: 0,
            done: false,
        }
    }

    /// Runs the enumeration to its end
    ///
    /// Returns the records gathered so far and the error that cut the list short, if any.
    pub fn exhaust(self) -> (Vec<T>, Option<io::Error>) {
        let mut items = Vec::new();
        for item in self {
            match item {
                Ok(item) => items.push(item),
                Err(e) => return (items, Some(e)),
            }
        }
        (items, None)
    }
}

impl<T> Iterator for Enumeration<'_, T> {
    type Item = io::Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match (self.query)(self.index) {
            Ok(item) => {
                self.index += 1;
                Some(Ok(item))
            }
            Err(e) => {
                self.done = true;
                if is_end_of_enumeration(&e) {
                    None
                } else {
                    Some(Err(e))
                }
            }
        }
    }
}

impl<T> std::iter::FusedIterator for Enumeration<'_, T> {}

impl<T> fmt::Debug for Enumeration<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enumeration")
            .field("index", &self.index)
            .field("done", &self.done)
            .finish()
    }
}
