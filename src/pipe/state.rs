//! The shared state machine coordinating one writer and one reader.
//!
//! All mutable pipe state (segment chain, cursors, completion flags,
//! wakers) lives behind a single mutex. Wakers are extracted under the
//! lock but dispatched through the scheduler only after it is released,
//! so an inline scheduler can never re-enter pipe state mid-update.

use std::collections::VecDeque;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, Waker};

use bytes::{Bytes, BytesMut};

use crate::buffer::SegmentPool;
use crate::config::PipeConfig;
use crate::error::PipeError;
use crate::pipe::buf::{Cursor, FlushResult, ReadBuf, ReadResult};
use crate::scheduler::Scheduler;

pub(crate) struct PipeCore {
    state: Mutex<State>,
    scheduler: Arc<dyn Scheduler>,
    pause_threshold: usize,
    resume_threshold: usize,
    min_segment_size: usize,
}

struct State {
    /// Committed, unconsumed segments in stream order.
    chain: VecDeque<Bytes>,
    /// Stream offset of the first byte of `chain.front()`.
    chain_start: u64,
    /// Stream offset just past the last committed byte.
    write_pos: u64,
    /// Stream offset of the first unconsumed byte.
    consumed_pos: u64,
    /// Stream offset just past the last examined byte.
    examined_pos: u64,
    /// Stamp of the most recently handed-out snapshot.
    generation: u64,
    /// A snapshot is outstanding and `advance_to` has not been called.
    snapshot_live: bool,
    read_waker: Option<Waker>,
    flush_waker: Option<Waker>,
    read_cancel: bool,
    flush_cancel: bool,
    /// A flush hit the pause threshold; it resumes only at the resume
    /// threshold, so spurious polls cannot thrash across the boundary.
    flush_paused: bool,
    writer_done: bool,
    reader_done: bool,
    writer_fault: Option<String>,
    reader_fault: Option<String>,
    pool: SegmentPool,
}

impl State {
    /// Builds a zero-copy view of `consumed_pos..write_pos` and marks it
    /// as the one outstanding snapshot.
    fn snapshot(&mut self) -> ReadBuf {
        self.generation = self.generation.wrapping_add(1);
        self.snapshot_live = true;

        let mut skip = (self.consumed_pos - self.chain_start) as usize;
        let mut segments = Vec::with_capacity(self.chain.len());
        for segment in &self.chain {
            if skip >= segment.len() {
                skip -= segment.len();
                continue;
            }
            if skip > 0 {
                segments.push(segment.slice(skip..));
                skip = 0;
            } else {
                segments.push(segment.clone());
            }
        }

        let len = (self.write_pos - self.consumed_pos) as usize;
        ReadBuf::new(segments, self.consumed_pos, len, self.generation)
    }

    fn buffered(&self) -> usize {
        (self.write_pos - self.consumed_pos) as usize
    }
}

impl PipeCore {
    pub(crate) fn new(config: &PipeConfig) -> Self {
        Self {
            state: Mutex::new(State {
                chain: VecDeque::new(),
                chain_start: 0,
                write_pos: 0,
                consumed_pos: 0,
                examined_pos: 0,
                generation: 0,
                snapshot_live: false,
                read_waker: None,
                flush_waker: None,
                read_cancel: false,
                flush_cancel: false,
                flush_paused: false,
                writer_done: false,
                reader_done: false,
                writer_fault: None,
                reader_fault: None,
                pool: SegmentPool::new(config.max_pooled_segments(), config.min_segment_size()),
            }),
            scheduler: Arc::clone(config.scheduler()),
            pause_threshold: config.pause_threshold(),
            resume_threshold: config.resume_threshold(),
            min_segment_size: config.min_segment_size(),
        }
    }

    pub(crate) fn min_segment_size(&self) -> usize {
        self.min_segment_size
    }

    /// Rents a writable block from the pool.
    pub(crate) fn rent(&self, min: usize) -> BytesMut {
        self.lock().pool.rent(min)
    }

    /// Publishes a committed segment to the reader side.
    pub(crate) fn commit(&self, segment: Bytes) {
        let mut s = self.lock();
        if s.reader_done {
            // Nobody will read it; recycle immediately.
            s.pool.release(segment);
            return;
        }
        s.write_pos += segment.len() as u64;
        s.chain.push_back(segment);
        let waker = s.read_waker.take();
        drop(s);
        self.wake(waker);
    }

    pub(crate) fn poll_read(&self, cx: &mut Context<'_>) -> Poll<Result<ReadResult, PipeError>> {
        let mut s = self.lock();
        if s.reader_done {
            return Poll::Ready(Err(PipeError::InvalidOperation {
                message: "read after reader completed",
            }));
        }
        if s.snapshot_live {
            return Poll::Ready(Err(PipeError::InvalidOperation {
                message: "previous snapshot not yet returned with advance_to",
            }));
        }
        if let Some(message) = &s.writer_fault {
            return Poll::Ready(Err(PipeError::Faulted {
                message: message.clone(),
            }));
        }

        let cancelled = mem::take(&mut s.read_cancel);
        if cancelled || s.examined_pos < s.write_pos || s.writer_done {
            let completed = s.writer_done;
            let buf = s.snapshot();
            return Poll::Ready(Ok(ReadResult::new(buf, completed, cancelled)));
        }

        s.read_waker = Some(cx.waker().clone());
        Poll::Pending
    }

    /// Applies the reader's consumed/examined report for `buf`.
    pub(crate) fn advance_to(
        &self,
        buf: &ReadBuf,
        consumed: Cursor,
        examined: Cursor,
    ) -> Result<(), PipeError> {
        let mut s = self.lock();
        if s.reader_done {
            return Err(PipeError::InvalidOperation {
                message: "advance_to after reader completed",
            });
        }
        if !s.snapshot_live || buf.generation() != s.generation {
            return Err(PipeError::InvalidCursor {
                message: "snapshot is stale",
            });
        }
        if consumed < buf.start() || examined < consumed || buf.end() < examined {
            return Err(PipeError::InvalidCursor {
                message: "cursors out of order or outside the snapshot",
            });
        }

        s.snapshot_live = false;
        s.consumed_pos = consumed.pos();
        s.examined_pos = examined.pos();

        // Release segments the consumed cursor has fully passed.
        loop {
            let front_end = match s.chain.front() {
                Some(front) => s.chain_start + front.len() as u64,
                None => break,
            };
            if front_end > s.consumed_pos {
                break;
            }
            if let Some(segment) = s.chain.pop_front() {
                s.chain_start = front_end;
                s.pool.release(segment);
            }
        }

        let waker = if s.flush_paused && s.buffered() <= self.resume_threshold {
            s.flush_waker.take()
        } else {
            None
        };
        drop(s);
        self.wake(waker);
        Ok(())
    }

    pub(crate) fn poll_flush(&self, cx: &mut Context<'_>) -> Poll<Result<FlushResult, PipeError>> {
        let mut s = self.lock();
        if s.writer_done {
            return Poll::Ready(Err(PipeError::InvalidOperation {
                message: "flush after writer completed",
            }));
        }
        if let Some(message) = &s.reader_fault {
            return Poll::Ready(Err(PipeError::Faulted {
                message: message.clone(),
            }));
        }

        if mem::take(&mut s.flush_cancel) {
            s.flush_paused = false;
            let completed = s.reader_done;
            return Poll::Ready(Ok(FlushResult::new(completed, true)));
        }
        if s.reader_done {
            s.flush_paused = false;
            return Poll::Ready(Ok(FlushResult::new(true, false)));
        }

        let buffered = s.buffered();
        let ready = if s.flush_paused {
            buffered <= self.resume_threshold
        } else {
            buffered < self.pause_threshold
        };
        if ready {
            s.flush_paused = false;
            return Poll::Ready(Ok(FlushResult::new(false, false)));
        }

        s.flush_paused = true;
        s.flush_waker = Some(cx.waker().clone());
        Poll::Pending
    }

    pub(crate) fn complete_writer(&self, fault: Option<String>) {
        let mut s = self.lock();
        if s.writer_done {
            return;
        }
        s.writer_done = true;
        s.writer_fault = fault;
        let waker = s.read_waker.take();
        drop(s);
        self.wake(waker);
    }

    pub(crate) fn complete_reader(&self, fault: Option<String>) {
        let mut s = self.lock();
        if s.reader_done {
            return;
        }
        s.reader_done = true;
        s.reader_fault = fault;
        s.snapshot_live = false;

        // The reader will never consume the rest; recycle it now.
        while let Some(segment) = s.chain.pop_front() {
            s.chain_start += segment.len() as u64;
            s.pool.release(segment);
        }
        s.consumed_pos = s.write_pos;
        s.examined_pos = s.write_pos;

        let waker = s.flush_waker.take();
        drop(s);
        self.wake(waker);
    }

    pub(crate) fn cancel_pending_read(&self) {
        let mut s = self.lock();
        if s.reader_done {
            return;
        }
        s.read_cancel = true;
        let waker = s.read_waker.take();
        drop(s);
        self.wake(waker);
    }

    pub(crate) fn cancel_pending_flush(&self) {
        let mut s = self.lock();
        if s.writer_done {
            return;
        }
        s.flush_cancel = true;
        let waker = s.flush_waker.take();
        drop(s);
        self.wake(waker);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // State is a plain value and every mutation completes under the
        // guard, so a poisoned lock is still structurally consistent.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn wake(&self, waker: Option<Waker>) {
        if let Some(waker) = waker {
            self.scheduler.schedule(Box::new(move || waker.wake()));
        }
    }
}
