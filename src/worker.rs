//! Runs a [`Search`] on its own thread so the caller stays responsive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::board::Board;
use crate::error::{ChessError, ChessResult};
use crate::search::{Search, SearchResult};

/// A search running in the background on a private copy of the board.
///
/// The result can only be read through [`SearchTask::join`], which waits for
/// the thread to finish. Dropping a task that was never joined cancels it.
#[derive(Debug)]
pub struct SearchTask {
    /// `None` once joined.
    handle: Option<JoinHandle<ChessResult<SearchResult>>>,
    cancel: Arc<AtomicBool>,
}

impl SearchTask {
    pub fn spawn(board: Board, mut search: Search) -> ChessResult<Self> {
        let cancel = search.cancel_flag();
        let handle = thread::Builder::new()
            .name("lightboard-search".to_string())
            .spawn(move || search.find_best_move(&board))?;
        debug!("search thread started");
        Ok(Self {
            handle: Some(handle),
            cancel,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Asks the search to stop. [`SearchTask::join`] then reports
    /// [`ChessError::SearchCancelled`] unless the search had already finished.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn join(mut self) -> ChessResult<SearchResult> {
        let handle = self.handle.take().ok_or(ChessError::NoSearchPending)?;
        match handle.join() {
            Ok(result) => result,
            Err(_) => {
                warn!("search thread panicked");
                Err(ChessError::SearchPanicked)
            }
        }
    }
}

impl Drop for SearchTask {
    fn drop(&mut self) {
        if self.handle.is_some() {
            debug!("search task dropped, cancelling");
            self.cancel();
        }
    }
}
