use crate::{
    error::Error,
    store::{Backend, Hooks, RawIter, ReadBackend, ReadonlyStore, Store, WriteHooks},
};
use std::fmt;

///
/// EntryDebugger
///
/// Renders one raw key/value pair as a human-readable entry line.
/// Tables and module databases implement it through their entry codecs.
///

pub trait EntryDebugger {
    fn debug_entry(&self, key: &[u8], value: &[u8]) -> Result<String, Error>;
}

// Falls back to hex when the pair cannot be decoded.
fn describe(debugger: &dyn EntryDebugger, key: &[u8], value: &[u8]) -> String {
    debugger
        .debug_entry(key, value)
        .unwrap_or_else(|err| format!("{key:02x?} -> {value:02x?} (undecodable: {err})"))
}

///
/// DebugStore
///

struct DebugStore<'a> {
    name: &'static str,
    reader: &'a dyn ReadonlyStore,
    writer: &'a dyn Store,
    debugger: &'a dyn EntryDebugger,
    print: &'a dyn Fn(&str),
}

impl DebugStore<'_> {
    fn emit(&self, line: &str) {
        tracing::debug!(store = self.name, "{line}");
        (self.print)(line);
    }

    fn wrap<'s>(&'s self, inner: RawIter<'s>) -> RawIter<'s> {
        Box::new(inner.inspect(move |item| match item {
            Ok((k, v)) => self.emit(&format!("  NEXT {}", describe(self.debugger, k, v))),
            Err(err) => self.emit(&format!("  ERR {err}")),
        }))
    }
}

impl ReadonlyStore for DebugStore<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        let value = self.reader.get(key)?;
        match &value {
            Some(v) => self.emit(&format!("GET {}", describe(self.debugger, key, v))),
            None => self.emit(&format!("GET {key:02x?} -> none")),
        }

        Ok(value)
    }

    fn has(&self, key: &[u8]) -> Result<bool, Error> {
        let found = self.reader.has(key)?;
        self.emit(&format!("HAS {key:02x?} -> {found}"));

        Ok(found)
    }

    fn iterator(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<RawIter<'_>, Error> {
        self.emit(&format!("ITERATOR {start:02x?} -> {end:02x?}"));
        let inner = self.reader.iterator(start, end)?;

        Ok(self.wrap(inner))
    }

    fn reverse_iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<RawIter<'_>, Error> {
        self.emit(&format!("ITERATOR {end:02x?} <- {start:02x?}"));
        let inner = self.reader.reverse_iterator(start, end)?;

        Ok(self.wrap(inner))
    }
}

impl Store for DebugStore<'_> {
    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        self.emit(&format!("SET {}", describe(self.debugger, key, value)));

        self.writer.set(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<(), Error> {
        let line = match self.reader.get(key)? {
            Some(value) => describe(self.debugger, key, &value),
            None => format!("{key:02x?}"),
        };
        self.emit(&format!("DEL {line}"));

        self.writer.delete(key)
    }
}

///
/// DebugBackend
///
/// Backend wrapper that decodes and prints every operation that passes
/// through it. Useful for inspecting the physical layout a table produces.
///

pub struct DebugBackend<'a> {
    parent: &'a dyn Backend,
    commitment: DebugStore<'a>,
    index: DebugStore<'a>,
}

impl<'a> DebugBackend<'a> {
    #[must_use]
    pub fn new(
        parent: &'a dyn Backend,
        debugger: &'a dyn EntryDebugger,
        print: &'a dyn Fn(&str),
    ) -> Self {
        Self {
            parent,
            commitment: DebugStore {
                name: "commitment",
                reader: parent.commitment_store_reader(),
                writer: parent.commitment_store(),
                debugger,
                print,
            },
            index: DebugStore {
                name: "index",
                reader: parent.index_store_reader(),
                writer: parent.index_store(),
                debugger,
                print,
            },
        }
    }
}

impl fmt::Debug for DebugBackend<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugBackend").finish_non_exhaustive()
    }
}

impl ReadBackend for DebugBackend<'_> {
    fn commitment_store_reader(&self) -> &dyn ReadonlyStore {
        &self.commitment
    }

    fn index_store_reader(&self) -> &dyn ReadonlyStore {
        &self.index
    }
}

impl Backend for DebugBackend<'_> {
    fn commitment_store(&self) -> &dyn Store {
        &self.commitment
    }

    fn index_store(&self) -> &dyn Store {
        &self.index
    }

    fn hooks(&self) -> Option<&dyn Hooks> {
        self.parent.hooks()
    }

    fn write_hooks(&self) -> Option<&dyn WriteHooks> {
        self.parent.write_hooks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use std::cell::RefCell;

    struct HexDebugger;

    impl EntryDebugger for HexDebugger {
        fn debug_entry(&self, key: &[u8], value: &[u8]) -> Result<String, Error> {
            if key.first() == Some(&0xff) {
                return Err(Error::store("unknown key"));
            }
            Ok(format!("{} = {}", String::from_utf8_lossy(key), String::from_utf8_lossy(value)))
        }
    }

    #[test]
    fn operations_are_printed_and_forwarded() {
        let backend = MemoryBackend::shared();
        let lines = RefCell::new(Vec::new());
        let print = |s: &str| lines.borrow_mut().push(s.to_string());
        let debug = DebugBackend::new(&backend, &HexDebugger, &print);

        debug.commitment_store().set(b"a", b"1").unwrap();
        debug.index_store().set(&[0xff], b"2").unwrap();
        let seen: Vec<_> = debug
            .commitment_store_reader()
            .iterator(None, None)
            .unwrap()
            .map(|kv| kv.unwrap().0)
            .collect();
        debug.commitment_store().delete(b"a").unwrap();

        assert_eq!(seen.len(), 2);
        assert!(!backend.commitment().has(b"a").unwrap());

        let lines = lines.borrow();
        assert_eq!(lines[0], "SET a = 1");
        assert!(lines[1].starts_with("SET [ff] -> "));
        assert!(lines[1].contains("undecodable"));
        assert!(lines[2].starts_with("ITERATOR"));
        assert_eq!(lines[3], "  NEXT a = 1");
        assert_eq!(lines.last().map(String::as_str), Some("DEL a = 1"));
    }
}
