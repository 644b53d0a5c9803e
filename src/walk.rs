//! Subtree traversal: [`Walk`] (GetNext) and [`BulkWalk`] (GetBulk).
//!
//! Both engines are streams over a sequence of single-shot requests; the
//! next request is not sent until the previous reply arrives. Yielded OIDs
//! are strictly increasing descendants of the root. Termination rules,
//! applied per varbind in order:
//!
//! - an exception value (`EndOfMibView`, `NoSuchObject`, `NoSuchInstance`)
//!   ends the walk;
//! - an OID outside the root subtree ends the walk;
//! - an OID not strictly greater than the previous one ends the walk —
//!   silently by default (agents that wrap are buggy but must not hang the
//!   client), or with [`Error::LoopDetected`] when the session was built
//!   with `strict_walk(true)`.
//!
//! When the very first reply already falls outside the subtree the engines
//! retry with a plain Get of the root, so walking an instance OID yields
//! its own value.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::session::Snmp;
use crate::varbind::VarBind;

type ReplyFuture = Pin<Box<dyn Future<Output = Result<Vec<VarBind>>> + Send>>;

/// Outcome of applying the termination rules to one varbind.
enum Step {
    Yield(VarBind),
    End,
    Fail(Box<Error>),
}

/// Shared per-varbind walk state: root prefix, ordering cursor, strictness.
struct Cursor {
    root: Oid,
    current: Oid,
    strict: bool,
}

impl Cursor {
    fn new(root: Oid, strict: bool) -> Self {
        Self {
            current: root.clone(),
            root,
            strict,
        }
    }

    /// Whether `oid` is a strict descendant of the walk root.
    fn in_subtree(&self, oid: &Oid) -> bool {
        oid.starts_with(&self.root) && oid.len() > self.root.len()
    }

    fn step(&mut self, vb: VarBind) -> Step {
        if vb.value.is_exception() {
            return Step::End;
        }
        if !self.in_subtree(&vb.oid) {
            return Step::End;
        }
        if vb.oid <= self.current {
            if self.strict {
                return Step::Fail(Box::new(Error::LoopDetected {
                    previous: self.current.clone(),
                    current: vb.oid,
                }));
            }
            tracing::warn!(
                target: "snmp2c::session",
                previous = %self.current,
                current = %vb.oid,
                "agent returned non-increasing OID, ending walk"
            );
            return Step::End;
        }
        self.current = vb.oid.clone();
        Step::Yield(vb)
    }
}

/// GetNext-based walk over an OID subtree.
///
/// Created by [`Snmp::walk`]. Use [`Walk::next`] to pull varbinds one at a
/// time or [`Walk::collect`] for the whole subtree; the type also
/// implements [`futures_core::Stream`].
pub struct Walk {
    session: Snmp,
    cursor: Cursor,
    first: bool,
    falling_back: bool,
    done: bool,
    pending: Option<ReplyFuture>,
}

impl Walk {
    pub(crate) fn new(session: Snmp, root: Oid) -> Self {
        let strict = session.config().strict_walk;
        Self {
            session,
            cursor: Cursor::new(root, strict),
            first: true,
            falling_back: false,
            done: false,
            pending: None,
        }
    }

    /// The next varbind, or `None` when the walk is complete.
    pub async fn next(&mut self) -> Option<Result<VarBind>> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }

    /// Run the walk to completion and collect every varbind.
    pub async fn collect(mut self) -> Result<Vec<VarBind>> {
        let mut results = Vec::new();
        while let Some(result) = self.next().await {
            results.push(result?);
        }
        Ok(results)
    }

    /// Handle the reply to a fallback Get of the root itself.
    fn finish_fallback(&mut self, varbinds: Vec<VarBind>) -> Option<VarBind> {
        self.done = true;
        varbinds.into_iter().next().filter(|vb| {
            vb.oid == self.cursor.root
                && !vb.value.is_exception()
                && vb.value != crate::value::Value::Null
        })
    }
}

impl Stream for Walk {
    type Item = Result<VarBind>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if self.done {
                return Poll::Ready(None);
            }

            if self.pending.is_none() {
                let session = self.session.clone();
                let oid = self.cursor.current.clone();
                self.pending = Some(Box::pin(async move { session.get_next(&[oid]).await }));
            }

            let result = match self.pending.as_mut().unwrap().as_mut().poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(result) => result,
            };
            self.pending = None;

            let varbinds = match result {
                Ok(varbinds) => varbinds,
                Err(e) => {
                    self.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
            };

            if self.falling_back {
                let vb = self.finish_fallback(varbinds);
                return Poll::Ready(vb.map(Ok));
            }

            let Some(vb) = varbinds.into_iter().next() else {
                self.done = true;
                return Poll::Ready(None);
            };

            if self.first {
                self.first = false;
                if !self.cursor.in_subtree(&vb.oid) {
                    // The root may name an instance rather than a subtree;
                    // ask for it directly.
                    let session = self.session.clone();
                    let root = self.cursor.root.clone();
                    self.falling_back = true;
                    self.pending = Some(Box::pin(async move { session.get(&[root]).await }));
                    continue;
                }
            }

            match self.cursor.step(vb) {
                Step::Yield(vb) => return Poll::Ready(Some(Ok(vb))),
                Step::End => {
                    self.done = true;
                    return Poll::Ready(None);
                }
                Step::Fail(e) => {
                    self.done = true;
                    return Poll::Ready(Some(Err(*e)));
                }
            }
        }
    }
}

/// GetBulk-based walk over an OID subtree.
///
/// Created by [`Snmp::bulk_walk`]. Each round fetches up to
/// `max_repetitions` varbinds with `non_repeaters = 0`; the termination
/// rules apply per varbind, and termination mid-batch discards the rest of
/// the batch.
pub struct BulkWalk {
    session: Snmp,
    cursor: Cursor,
    max_repetitions: u32,
    first: bool,
    falling_back: bool,
    done: bool,
    buffer: std::vec::IntoIter<VarBind>,
    pending: Option<ReplyFuture>,
}

impl BulkWalk {
    pub(crate) fn new(session: Snmp, root: Oid, max_repetitions: u32) -> Self {
        let strict = session.config().strict_walk;
        Self {
            session,
            cursor: Cursor::new(root, strict),
            max_repetitions,
            first: true,
            falling_back: false,
            done: false,
            buffer: Vec::new().into_iter(),
            pending: None,
        }
    }

    /// The next varbind, or `None` when the walk is complete.
    pub async fn next(&mut self) -> Option<Result<VarBind>> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }

    /// Run the walk to completion and collect every varbind.
    pub async fn collect(mut self) -> Result<Vec<VarBind>> {
        let mut results = Vec::new();
        while let Some(result) = self.next().await {
            results.push(result?);
        }
        Ok(results)
    }

    fn finish_fallback(&mut self, varbinds: Vec<VarBind>) -> Option<VarBind> {
        self.done = true;
        varbinds.into_iter().next().filter(|vb| {
            vb.oid == self.cursor.root
                && !vb.value.is_exception()
                && vb.value != crate::value::Value::Null
        })
    }
}

impl Stream for BulkWalk {
    type Item = Result<VarBind>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if self.done {
                return Poll::Ready(None);
            }

            // Drain the current batch first.
            if let Some(vb) = self.buffer.next() {
                if self.first {
                    self.first = false;
                    if !self.cursor.in_subtree(&vb.oid) {
                        let session = self.session.clone();
                        let root = self.cursor.root.clone();
                        self.falling_back = true;
                        self.buffer = Vec::new().into_iter();
                        self.pending = Some(Box::pin(async move { session.get(&[root]).await }));
                        continue;
                    }
                }

                match self.cursor.step(vb) {
                    Step::Yield(vb) => return Poll::Ready(Some(Ok(vb))),
                    Step::End => {
                        // Discard whatever remains of this batch.
                        self.done = true;
                        return Poll::Ready(None);
                    }
                    Step::Fail(e) => {
                        self.done = true;
                        return Poll::Ready(Some(Err(*e)));
                    }
                }
            }

            if self.pending.is_none() {
                let session = self.session.clone();
                let oid = self.cursor.current.clone();
                let max_repetitions = self.max_repetitions;
                self.pending = Some(Box::pin(async move {
                    session.get_bulk_with(&[oid], 0, max_repetitions).await
                }));
            }

            let result = match self.pending.as_mut().unwrap().as_mut().poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(result) => result,
            };
            self.pending = None;

            let varbinds = match result {
                Ok(varbinds) => varbinds,
                Err(e) => {
                    self.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
            };

            if self.falling_back {
                let vb = self.finish_fallback(varbinds);
                return Poll::Ready(vb.map(Ok));
            }

            if varbinds.is_empty() {
                // An empty batch cannot advance the walk.
                self.done = true;
                return Poll::Ready(None);
            }
            self.buffer = varbinds.into_iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::value::Value;

    fn cursor() -> Cursor {
        Cursor::new(oid!(1, 3, 6, 1, 2, 1, 1), false)
    }

    #[test]
    fn yields_strict_descendants() {
        let mut cursor = cursor();
        let vb = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::Integer(1));
        assert!(matches!(cursor.step(vb), Step::Yield(_)));
        assert_eq!(cursor.current, oid!(1, 3, 6, 1, 2, 1, 1, 1, 0));
    }

    #[test]
    fn ends_on_subtree_exit() {
        let mut cursor = cursor();
        let vb = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 2, 1, 0), Value::Integer(1));
        assert!(matches!(cursor.step(vb), Step::End));
    }

    #[test]
    fn ends_on_exception_values() {
        for value in [Value::EndOfMibView, Value::NoSuchObject, Value::NoSuchInstance] {
            let mut cursor = cursor();
            let vb = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), value);
            assert!(matches!(cursor.step(vb), Step::End));
        }
    }

    #[test]
    fn root_itself_is_not_a_descendant() {
        let mut cursor = cursor();
        let vb = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1), Value::Integer(1));
        assert!(matches!(cursor.step(vb), Step::End));
    }

    #[test]
    fn non_increasing_ends_walk_by_default() {
        let mut cursor = cursor();
        let first = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::Integer(1));
        assert!(matches!(cursor.step(first), Step::Yield(_)));

        // Same OID again: the duplicate guard trips.
        let dup = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::Integer(1));
        assert!(matches!(cursor.step(dup), Step::End));
    }

    #[test]
    fn non_increasing_fails_in_strict_mode() {
        let mut cursor = Cursor::new(oid!(1, 3, 6, 1, 2, 1, 1), true);
        let first = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::Integer(1));
        assert!(matches!(cursor.step(first), Step::Yield(_)));

        let back = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 2, 0), Value::Integer(1));
        match cursor.step(back) {
            Step::Fail(e) => assert!(matches!(
                *e,
                Error::LoopDetected { .. }
            )),
            _ => panic!("expected LoopDetected"),
        }
    }
}
