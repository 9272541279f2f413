use crate::{
    encoding::DecodedIndexKey,
    error::{Error, ErrorOrigin},
    obs::sink::{MetricsEvent, record},
    store::{KvPair, RawIter, ReadBackend},
    table::index::{Index, IndexSel},
    traits::Message,
    value::Value,
};
use std::fmt;

/// Predicate applied to every decoded message; rejected entries are skipped.
pub type Filter<'a, M> = Box<dyn Fn(&M) -> bool + 'a>;

///
/// IteratorOptions
///

pub struct IteratorOptions<'a, M> {
    pub reverse: bool,

    /// Key of the last entry already seen. Iteration resumes strictly after
    /// it, in whichever direction is configured.
    pub cursor: Option<Vec<u8>>,

    pub filter: Option<Filter<'a, M>>,
}

impl<'a, M> IteratorOptions<'a, M> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    #[must_use]
    pub fn cursor(mut self, cursor: impl Into<Vec<u8>>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: impl Fn(&M) -> bool + 'a) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }
}

impl<M> Default for IteratorOptions<'_, M> {
    fn default() -> Self {
        Self {
            reverse: false,
            cursor: None,
            filter: None,
        }
    }
}

impl<M> fmt::Debug for IteratorOptions<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IteratorOptions")
            .field("reverse", &self.reverse)
            .field("cursor", &self.cursor)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

/// Smallest key greater than every key starting with `prefix`, or `None`
/// when no such key exists.
pub(crate) fn prefix_end_bytes(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }

    None
}

/// Smallest key strictly greater than `key`.
pub(crate) fn inclusive_end_bytes(key: &[u8]) -> Vec<u8> {
    let mut end = Vec::with_capacity(key.len() + 1);
    end.extend_from_slice(key);
    end.push(0x00);

    end
}

fn no_current() -> Error {
    Error::not_found(ErrorOrigin::Iterator, "iterator is not positioned on an entry")
}

///
/// TableIterator
///
/// Walks one index of a table. Keys are decoded and messages loaded lazily,
/// then cached until the iterator moves. Also usable as a plain
/// `Iterator` over messages.
///

pub struct TableIterator<'a, M: Message> {
    index: Index<'a, M>,
    backend: &'a dyn ReadBackend,
    raw: RawIter<'a>,
    current: Option<KvPair>,
    keys: Option<DecodedIndexKey>,
    message: Option<M>,
    filter: Option<Filter<'a, M>>,
    scanned: u64,
    done: bool,
}

impl<'a, M: Message> TableIterator<'a, M> {
    pub(crate) fn open(
        index: Index<'a, M>,
        backend: &'a dyn ReadBackend,
        start: Vec<u8>,
        end: Option<Vec<u8>>,
        options: IteratorOptions<'a, M>,
    ) -> Result<Self, Error> {
        let store = index.store(backend);
        let raw = if options.reverse {
            store.reverse_iterator(Some(&start), end.as_deref())?
        } else {
            store.iterator(Some(&start), end.as_deref())?
        };

        tracing::trace!(
            table = M::MESSAGE_NAME,
            index = %index.fields(),
            reverse = options.reverse,
            "iterator opened"
        );

        Ok(Self {
            index,
            backend,
            raw,
            current: None,
            keys: None,
            message: None,
            filter: options.filter,
            scanned: 0,
            done: false,
        })
    }

    /// Move to the next entry that passes the filter. Returns false once
    /// the range is exhausted.
    pub fn advance(&mut self) -> Result<bool, Error> {
        loop {
            self.keys = None;
            self.message = None;

            if self.done {
                self.current = None;
                return Ok(false);
            }
            let Some(item) = self.raw.next() else {
                self.done = true;
                self.current = None;
                return Ok(false);
            };
            match item {
                Ok(pair) => self.current = Some(pair),
                Err(err) => {
                    self.done = true;
                    self.current = None;
                    return Err(err);
                }
            }
            self.scanned += 1;

            if self.filter.is_none() {
                return Ok(true);
            }
            self.resolve_message()?;
            let keep = match (&self.filter, &self.message) {
                (Some(filter), Some(message)) => filter(message),
                _ => true,
            };
            if keep {
                return Ok(true);
            }
        }
    }

    /// Decoded key of the current entry.
    pub fn keys(&mut self) -> Result<&DecodedIndexKey, Error> {
        if self.keys.is_none() {
            let (key, value) = self.current.as_ref().ok_or_else(no_current)?;
            self.keys = Some(self.index.codec().decode_index_key(key, value)?);
        }

        self.keys.as_ref().ok_or_else(no_current)
    }

    /// Values of the index fields for the current entry.
    pub fn index_values(&mut self) -> Result<Vec<Value>, Error> {
        Ok(self.keys()?.index_values.clone())
    }

    pub fn primary_key(&mut self) -> Result<Vec<Value>, Error> {
        let keys = self.keys()?;

        keys.primary_key.clone().ok_or_else(|| {
            Error::corruption(
                ErrorOrigin::Iterator,
                format!("{} index entry without a primary key", M::MESSAGE_NAME),
            )
        })
    }

    /// The record behind the current entry.
    pub fn message(&mut self) -> Result<M, Error> {
        self.resolve_message()?;

        self.message.clone().ok_or_else(no_current)
    }

    /// Raw key of the current entry, usable as a resume cursor.
    #[must_use]
    pub fn cursor(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(key, _)| key.as_slice())
    }

    fn resolve_message(&mut self) -> Result<(), Error> {
        if self.message.is_some() {
            return Ok(());
        }
        let primary_key = self.primary_key()?;

        let message = match self.index.sel() {
            IndexSel::Primary => {
                let (_, value) = self.current.as_ref().ok_or_else(no_current)?;
                self.index
                    .table()
                    .primary
                    .unmarshal_value(&primary_key, value)?
            }
            IndexSel::Secondary(_) => self
                .index
                .table()
                .get(self.backend, &primary_key)?
                .ok_or_else(|| {
                    Error::corruption(
                        ErrorOrigin::Iterator,
                        format!(
                            "index {} of {} points at a missing record",
                            self.index.fields(),
                            M::MESSAGE_NAME
                        ),
                    )
                })?,
        };
        self.message = Some(message);

        Ok(())
    }
}

impl<M: Message> Iterator for TableIterator<'_, M> {
    type Item = Result<M, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(true) => Some(self.message()),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl<M: Message> fmt::Debug for TableIterator<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableIterator")
            .field("index", &self.index)
            .field("cursor", &self.cursor())
            .field("scanned", &self.scanned)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<M: Message> Drop for TableIterator<'_, M> {
    fn drop(&mut self) {
        if self.scanned > 0 {
            record(MetricsEvent::RowsScanned {
                table: M::MESSAGE_NAME,
                rows: self.scanned,
            });
        }
    }
}
