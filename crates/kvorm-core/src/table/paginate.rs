use crate::{
    error::Error,
    store::ReadBackend,
    table::{
        index::Index,
        iterator::{Filter, IteratorOptions, TableIterator},
    },
    traits::Message,
    value::Value,
};
use std::fmt;

///
/// PageRequest
///
/// `key` resumes after a previous page's `next_key` and cannot be combined
/// with `offset`. A zero `limit` means no limit.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PageRequest {
    pub key: Option<Vec<u8>>,
    pub offset: u64,
    pub limit: u64,
    pub count_total: bool,
    pub reverse: bool,
}

///
/// PaginationRequest
///
/// A page request plus the slice of the index to page through: everything,
/// a key prefix, or an inclusive `start..=end` range.
///

pub struct PaginationRequest<'a, M> {
    pub page: PageRequest,
    pub prefix: Option<Vec<Value>>,
    pub start: Option<Vec<Value>>,
    pub end: Option<Vec<Value>>,
    pub filter: Option<Filter<'a, M>>,
}

impl<'a, M> PaginationRequest<'a, M> {
    #[must_use]
    pub const fn new(page: PageRequest) -> Self {
        Self {
            page,
            prefix: None,
            start: None,
            end: None,
            filter: None,
        }
    }

    #[must_use]
    pub fn prefix(mut self, prefix: Vec<Value>) -> Self {
        self.prefix = Some(prefix);
        self
    }

    #[must_use]
    pub fn range(mut self, start: Vec<Value>, end: Vec<Value>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: impl Fn(&M) -> bool + 'a) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }
}

impl<M> fmt::Debug for PaginationRequest<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginationRequest")
            .field("page", &self.page)
            .field("prefix", &self.prefix)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

///
/// Page
///
/// `cursors[i]` is the raw key of `items[i]`. `next_key` is the cursor of
/// the last item. `total` is filled when the request asked for it, and when
/// the offset alone ran past the end (it is then the number skipped). A page
/// resumed from a key counts only the entries after that key.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page<M> {
    pub items: Vec<M>,
    pub cursors: Vec<Vec<u8>>,
    pub next_key: Option<Vec<u8>>,
    pub have_more: bool,
    pub total: Option<u64>,
}

pub(crate) fn paginate<'a, M: Message>(
    index: Index<'a, M>,
    backend: &'a dyn ReadBackend,
    request: PaginationRequest<'a, M>,
) -> Result<Page<M>, Error> {
    let PaginationRequest {
        page,
        prefix,
        start,
        end,
        filter,
    } = request;

    if page.key.is_some() && page.offset > 0 {
        return Err(Error::invalid_page_request(
            "a page can resume from a key or skip an offset, not both",
        ));
    }
    if prefix.is_some() && (start.is_some() || end.is_some()) {
        return Err(Error::invalid_page_request(
            "a page can select a prefix or a range, not both",
        ));
    }

    let options = IteratorOptions {
        reverse: page.reverse,
        cursor: page.key,
        filter,
    };
    let mut it = match (prefix, start, end) {
        (Some(prefix), _, _) => index.prefix_iterator(backend, &prefix, options)?,
        (None, Some(start), Some(end)) => index.range_iterator(backend, &start, &end, options)?,
        (None, None, None) => index.iterator(backend, options)?,
        (None, _, _) => {
            return Err(Error::invalid_page_request(
                "a range needs both a start and an end",
            ));
        }
    };

    collect_page(&mut it, page.offset, page.limit, page.count_total)
}

fn collect_page<M: Message>(
    it: &mut TableIterator<'_, M>,
    offset: u64,
    limit: u64,
    count_total: bool,
) -> Result<Page<M>, Error> {
    let mut i = 0u64;
    while i < offset {
        if !it.advance()? {
            return Ok(Page {
                total: Some(i),
                ..Page::default()
            });
        }
        i += 1;
    }

    let mut page = Page::default();
    while it.advance()? {
        if limit != 0 && i >= offset.saturating_add(limit) {
            page.have_more = true;
            if !count_total {
                break;
            }
        } else {
            page.items.push(it.message()?);
            if let Some(cursor) = it.cursor() {
                page.cursors.push(cursor.to_vec());
            }
        }
        i += 1;
    }

    page.next_key = page.cursors.last().cloned();
    page.total = count_total.then_some(i);

    tracing::debug!(
        table = M::MESSAGE_NAME,
        items = page.items.len(),
        have_more = page.have_more,
        "page collected"
    );

    Ok(page)
}
