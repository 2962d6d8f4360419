//! ConnectionPool: writer + read pool with round-robin selection.
//!
//! The only place in the crate that holds `Mutex<Connection>`.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use kudos_core::{StorageError, StorageResult};
use rusqlite::{Connection, OpenFlags};

use crate::pragmas;

const DEFAULT_READ_POOL_SIZE: usize = 2;

/// 1 writer + N readers. In-memory pools have no readers and read through
/// the writer.
pub struct ConnectionPool {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    read_index: AtomicUsize,
}

impl ConnectionPool {
    /// Open the writer only. Readers are attached with [`Self::attach_readers`]
    /// once the schema exists.
    pub fn open_writer(path: &Path) -> StorageResult<Self> {
        let writer = Connection::open(path).map_err(|e| StorageError::Unavailable {
            reason: format!("open {}: {e}", path.display()),
        })?;
        pragmas::configure_connection(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            read_index: AtomicUsize::new(0),
        })
    }

    pub fn attach_readers(&mut self, path: &Path, read_pool_size: usize) -> StorageResult<()> {
        let pool_size = if read_pool_size == 0 {
            DEFAULT_READ_POOL_SIZE
        } else {
            read_pool_size
        };

        for i in 0..pool_size {
            let reader = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| StorageError::Unavailable {
                reason: format!("open reader {i} on {}: {e}", path.display()),
            })?;
            pragmas::configure_readonly_connection(&reader)?;
            self.readers.push(Mutex::new(reader));
        }
        Ok(())
    }

    /// Single private in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        let writer = Connection::open_in_memory().map_err(|e| StorageError::Unavailable {
            reason: format!("open in-memory database: {e}"),
        })?;
        pragmas::configure_connection(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            read_index: AtomicUsize::new(0),
        })
    }

    pub fn with_writer<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Connection) -> StorageResult<T>,
    {
        let mut conn = self.writer.lock().map_err(|_| StorageError::Unavailable {
            reason: "writer lock poisoned".to_string(),
        })?;
        f(&mut conn)
    }

    /// Round-robin reader, falling back to the writer when there are none.
    pub fn with_reader<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T>,
    {
        if self.readers.is_empty() {
            return self.with_writer(|conn| f(conn));
        }

        let index = self.read_index.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[index]
            .lock()
            .map_err(|_| StorageError::Unavailable {
                reason: format!("reader {index} lock poisoned"),
            })?;
        f(&conn)
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    pub fn is_wal_mode(&self) -> bool {
        self.with_writer(|conn| {
            let mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .unwrap_or_default();
            Ok(mode.eq_ignore_ascii_case("wal"))
        })
        .unwrap_or(false)
    }
}
