use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use super::request::{RedoRequest, UndoRequest};
use super::{Cid, Config, Content, DoRequest, Error, Operation, Request, Result, UserId, Vector};

/// Result of a call to [`State::execute`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The request was translated to the current state and applied. Contains
    /// the translated request.
    Executed(DoRequest),

    /// The request had already been executed. It was recorded in the log but
    /// not applied again.
    Duplicate,

    /// The request can't be executed yet and was put in the queue.
    Deferred,
}

type Callback = Box<dyn FnMut(&DoRequest) + Send>;

/// Document state of one editing session: the current content, the current
/// vector, the log of executed requests and the queue of requests that are
/// waiting for their causal predecessors.
///
/// ```
/// use tandem::ops::Insert;
/// use tandem::{Content, DoRequest, State, Vector};
///
/// let mut state = State::new(Content::new(), Vector::new());
///
/// let alice = DoRequest::new(1, Vector::new(), Insert::new(0, Content::from_text(1, "X")));
/// let bob = DoRequest::new(2, Vector::new(), Insert::new(0, Content::from_text(2, "Y")));
///
/// state.queue(bob.into());
/// state.queue(alice.into());
/// state.execute_all().unwrap();
///
/// assert_eq!(state.content().text(), "XY");
/// ```
pub struct State {
    pub(crate) content: Content,
    pub(crate) vector: Vector,
    log: Vec<Request>,
    queue: Vec<Request>,
    cache: HashMap<(Request, Vector), DoRequest>,
    config: Config,
    on_execute: Option<Callback>,
}

impl State {
    /// Returns a new state with the given content and vector and the default
    /// configuration.
    pub fn new(content: Content, vector: Vector) -> State {
        State::with_config(content, vector, Config::default())
    }

    /// Returns a new state with the given content, vector and configuration.
    pub fn with_config(content: Content, vector: Vector, config: Config) -> State {
        State {
            content,
            vector,
            log: Vec::new(),
            queue: Vec::new(),
            cache: HashMap::new(),
            config,
            on_execute: None,
        }
    }

    /// Returns the current content.
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Returns the current vector.
    pub fn vector(&self) -> &Vector {
        &self.vector
    }

    /// Returns the log of executed requests, oldest first.
    pub fn log(&self) -> &[Request] {
        &self.log
    }

    /// Returns the requests that are waiting to be executed.
    pub fn pending(&self) -> &[Request] {
        &self.queue
    }

    /// Registers a callback that is invoked with every translated request
    /// right after it has been applied.
    pub fn on_execute(&mut self, callback: impl FnMut(&DoRequest) + Send + 'static) {
        self.on_execute = Some(Box::new(callback));
    }

    /// Drops all memoized translations.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Adds a request to the queue.
    pub fn queue(&mut self, request: Request) {
        self.queue.push(request);
    }

    /// Returns true if the given request can be executed in the current
    /// state: all of its causal predecessors must be executed, and undo and
    /// redo requests also need a request to refer to.
    pub fn can_execute(&self, request: &Request) -> bool {
        if !request.vector().causally_before(&self.vector) {
            return false;
        }

        match request {
            Request::Do(_) => true,
            Request::Undo(_) | Request::Redo(_) => request.associated_request(&self.log).is_some(),
        }
    }

    /// Executes the given request if it is executable, or puts it in the
    /// queue otherwise.
    pub fn execute(&mut self, request: Request) -> Result<Outcome> {
        if !self.can_execute(&request) {
            tracing::debug!("deferring {request} at {}", self.vector);
            self.queue(request);
            return Ok(Outcome::Deferred);
        }

        if request.sequence() < self.vector.get(request.user()) {
            return self.record_duplicate(request);
        }

        let request = match request.is_reversal() {
            true => {
                // Undo and redo requests take over the vector of the request
                // they refer to, except for their issuer's own component.
                let associated = request
                    .associated_request(&self.log)
                    .ok_or_else(|| unassociated(&request))?;
                let vector = associated
                    .vector()
                    .set(request.user(), request.sequence());

                request.with_vector(vector)
            }
            false => request,
        };

        let target = self.vector.clone();
        let translated = self.translate(&request, &target)?;

        let entry = match request {
            Request::Do(request) => Request::Do(request.make_reversible(&translated, self)?),
            request => request,
        };

        translated.execute(self)?;
        self.log.push(entry);

        tracing::debug!("executed {translated}, now at {}", self.vector);

        if let Some(callback) = self.on_execute.as_mut() {
            callback(&translated);
        }

        Ok(Outcome::Executed(translated))
    }

    /// Executes the first executable request in the queue. Returns `None` if
    /// no queued request can be executed. If execution fails, the request is
    /// put back where it was, unless it can never succeed, in which case it
    /// is dropped.
    pub fn execute_next(&mut self) -> Result<Option<Outcome>> {
        let Some(index) = self.next_executable() else {
            return Ok(None);
        };

        let request = self.queue.remove(index);

        self.execute_queued(request)
            .map(Some)
            .map_err(|(error, request)| {
                if let Some(request) = request {
                    self.queue.insert(index, request);
                }

                error
            })
    }

    /// Executes queued requests until none of them is executable. Requests
    /// that fail are skipped, so they don't hold up the rest of the queue.
    /// Returns the translated requests in the order they were applied, or the
    /// first failure once the queue is drained. Failed requests that may
    /// succeed later stay in the queue.
    pub fn execute_all(&mut self) -> Result<Vec<DoRequest>> {
        let mut executed = Vec::new();
        let mut held = Vec::new();
        let mut failure = None;

        while let Some(index) = self.next_executable() {
            let request = self.queue.remove(index);

            match self.execute_queued(request) {
                Ok(outcome) => {
                    if let Outcome::Executed(request) = outcome {
                        executed.push(request);
                    }

                    // Progress may have unblocked the held requests.
                    self.queue.splice(0..0, held.drain(..));
                }
                Err((error, request)) => {
                    held.extend(request);
                    failure.get_or_insert(error);
                }
            }
        }

        self.queue.splice(0..0, held);

        match failure {
            Some(error) => Err(error),
            None => Ok(executed),
        }
    }

    fn next_executable(&self) -> Option<usize> {
        self.queue
            .iter()
            .position(|request| self.can_execute(request))
    }

    /// Executes a request taken from the queue. On failure, the request is
    /// handed back unless it can never succeed.
    fn execute_queued(
        &mut self,
        request: Request,
    ) -> std::result::Result<Outcome, (Error, Option<Request>)> {
        match self.execute(request.clone()) {
            Ok(outcome) => Ok(outcome),
            Err(error) if error.is_permanent() => {
                tracing::warn!("dropping {request}: {error}");
                Err((error, None))
            }
            Err(error) => {
                tracing::warn!("failed to execute {request}: {error}");
                Err((error, Some(request)))
            }
        }
    }

    /// Issues and executes a local do-request by the given user at the current
    /// vector. Returns the issued (untranslated) request for broadcasting.
    pub fn local_do(&mut self, user: UserId, operation: impl Into<Operation>) -> Result<Request> {
        let request = Request::Do(DoRequest::new(user, self.vector.clone(), operation));
        self.execute(request.clone())?;

        Ok(request)
    }

    /// Issues and executes a local undo by the given user. Returns `None` if
    /// there is nothing to undo.
    pub fn local_undo(&mut self, user: UserId) -> Result<Option<Request>> {
        let request = Request::Undo(UndoRequest {
            user,
            vector: self.vector.clone(),
        });

        self.execute_local(request)
    }

    /// Issues and executes a local redo by the given user. Returns `None` if
    /// there is nothing to redo.
    pub fn local_redo(&mut self, user: UserId) -> Result<Option<Request>> {
        let request = Request::Redo(RedoRequest {
            user,
            vector: self.vector.clone(),
        });

        self.execute_local(request)
    }

    fn execute_local(&mut self, request: Request) -> Result<Option<Request>> {
        if !self.can_execute(&request) {
            return Ok(None);
        }

        self.execute(request.clone())?;

        Ok(Some(request))
    }

    fn record_duplicate(&mut self, request: Request) -> Result<Outcome> {
        if let Request::Do(DoRequest {
            operation: Operation::Delete(delete),
            ..
        }) = &request
        {
            if !delete.is_reversible() {
                tracing::warn!("rejecting non-reversible duplicate {request}");

                return Err(Error::IrreversibleDuplicate {
                    user: request.user(),
                    vector: request.vector().clone(),
                });
            }
        }

        tracing::debug!("recording duplicate {request}");
        self.log.push(request);

        Ok(Outcome::Duplicate)
    }

    /// Translates a request to the given vector, i.e. returns the do-request
    /// that has the same effect at `target` as the given request had at the
    /// time it was issued.
    pub fn translate(&mut self, request: &Request, target: &Vector) -> Result<DoRequest> {
        if let Request::Do(request) = request {
            if &request.vector == target {
                return Ok(request.clone());
            }
        }

        let key = (request.clone(), target.clone());

        if let Some(translated) = self.cache.get(&key) {
            return Ok(translated.clone());
        }

        let translated = self.translate_uncached(request, target)?;

        if self.config.cache_capacity > 0 {
            if self.cache.len() >= self.config.cache_capacity {
                tracing::debug!("translation cache reached {} entries, clearing", self.cache.len());
                self.cache.clear();
            }

            self.cache.insert(key, translated.clone());
        }

        Ok(translated)
    }

    fn translate_uncached(&mut self, request: &Request, target: &Vector) -> Result<DoRequest> {
        let user = request.user();

        if request.is_reversal() {
            // Try to mirror late: translate the associated request to the
            // target (with the issuer's component taken from the associated
            // request) and mirror it there.
            let associated = request
                .associated_request(&self.log)
                .cloned()
                .ok_or_else(|| unassociated(request))?;

            let mirror_at = target.set(user, associated.sequence());

            if let Some(by) = target.get(user).checked_sub(associated.sequence()) {
                if self.reachable(&mirror_at) {
                    tracing::trace!("mirroring {request} at {mirror_at}");

                    return self.translate(&associated, &mirror_at)?.mirror(by);
                }
            }
        }

        let users = self.vector.users().collect::<Vec<_>>();

        for other in users {
            if other == user || target.get(other) <= request.vector().get(other) {
                continue;
            }

            let last = target.get(other) - 1;

            if let Some(folded) = self.try_fold(request, target, other, last)? {
                return Ok(folded);
            }

            let Some(transform_at) = target.decr(other, 1) else {
                continue;
            };

            if !self.reachable(&transform_at) {
                continue;
            }

            let Some(last) = self.request_by_user(other, last).cloned() else {
                continue;
            };

            tracing::trace!("transforming {request} against {last} at {transform_at}");

            let r1 = self.translate(request, &transform_at)?;
            let r2 = self.translate(&last, &transform_at)?;

            let cid = match r1.operation.requires_cid() {
                true => self.resolve_cid(request, &last, &r1, &r2)?,
                false => None,
            };

            return Ok(r1.transform(&r2, cid));
        }

        Err(Error::NoTranslationPath {
            user,
            target: target.clone(),
        })
    }

    /// Folds over another user's last undo/redo pair if that user's latest
    /// request at `target` is an undo or redo.
    fn try_fold(
        &mut self,
        request: &Request,
        target: &Vector,
        other: UserId,
        last: u64,
    ) -> Result<Option<DoRequest>> {
        let Some(previous) = self.request_by_user(other, last) else {
            return Ok(None);
        };

        if !previous.is_reversal() {
            return Ok(None);
        }

        let Some(associated) = previous.associated_request(&self.log) else {
            return Ok(None);
        };

        let Some(by) = target.get(other).checked_sub(associated.vector().get(other)) else {
            return Ok(None);
        };

        let Some(fold_at) = target.decr(other, by) else {
            return Ok(None);
        };

        if !self.reachable(&fold_at) || !request.vector().causally_before(&fold_at) {
            return Ok(None);
        }

        tracing::trace!("folding {request} over user {other} at {fold_at}");

        let translated = self.translate(request, &fold_at)?;
        translated.fold(other, by).map(Some)
    }

    /// Decides which of two requests is displaced if their operations touch
    /// the same position: first from their positions, then from their
    /// positions at the least common successor of both requests, and finally
    /// by displacing the request of the user with the higher id.
    fn resolve_cid(
        &mut self,
        request: &Request,
        last: &Request,
        r1: &DoRequest,
        r2: &DoRequest,
    ) -> Result<Option<Cid>> {
        if let Some(cid) = r1.operation.concurrency_id(&r2.operation) {
            return Ok(Some(cid));
        }

        let lcs = request.vector().least_common_successor(last.vector());

        if self.reachable(&lcs) {
            let r1 = self.translate(request, &lcs)?;
            let r2 = self.translate(last, &lcs)?;

            if let Some(cid) = r1.operation.concurrency_id(&r2.operation) {
                return Ok(Some(cid));
            }
        }

        Ok(match r1.user.cmp(&r2.user) {
            Ordering::Less => Some(Cid::Other),
            Ordering::Greater => Some(Cid::Own),
            Ordering::Equal => None,
        })
    }

    /// Returns true if the given vector can be reached by translation, i.e.
    /// every user's component can be derived from the log.
    pub fn reachable(&self, vector: &Vector) -> bool {
        self.vector
            .users()
            .all(|user| self.reachable_user(vector, user))
    }

    fn reachable_user(&self, vector: &Vector, user: UserId) -> bool {
        let first = self
            .first_request_by_user(user)
            .map(Request::sequence)
            .unwrap_or_else(|| self.vector.get(user));

        let mut n = vector.get(user);

        loop {
            if n == first {
                return true;
            }

            let Some(request) = n.checked_sub(1).and_then(|n| self.request_by_user(user, n)) else {
                return false;
            };

            match request {
                Request::Do(request) => {
                    return request.vector.incr(user, 1).causally_before(vector);
                }
                Request::Undo(_) | Request::Redo(_) => match request.associated_request(&self.log) {
                    Some(associated) => n = associated.sequence(),
                    None => return false,
                },
            }
        }
    }

    /// Returns the given user's `n`-th request (counting from 0) if it was
    /// logged.
    pub fn request_by_user(&self, user: UserId, n: u64) -> Option<&Request> {
        self.log
            .iter()
            .find(|request| request.user() == user && request.sequence() == n)
    }

    /// Returns the earliest logged request of the given user.
    pub fn first_request_by_user(&self, user: UserId) -> Option<&Request> {
        self.log
            .iter()
            .filter(|request| request.user() == user)
            .min_by_key(|request| request.sequence())
    }
}

fn unassociated(request: &Request) -> Error {
    Error::Unassociated {
        user: request.user(),
        vector: request.vector().clone(),
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("content", &self.content)
            .field("vector", &self.vector)
            .field("log", &self.log)
            .field("queue", &self.queue)
            .field("cached", &self.cache.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for State {
    fn default() -> Self {
        State::new(Content::new(), Vector::new())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{Outcome, State};
    use crate::ops::{Delete, Insert};
    use crate::{Config, Content, DoRequest, Error, Len, Operation, Request, Vector};

    fn v(s: &str) -> Vector {
        s.parse().unwrap()
    }

    fn insert(user: u32, vector: &str, position: usize, text: &str) -> Request {
        DoRequest::new(
            user,
            v(vector),
            Insert::new(position, Content::from_text(user, text)),
        )
        .into()
    }

    fn execute(state: &mut State, request: &Request) {
        state.execute(request.clone()).unwrap();
    }

    #[test]
    fn test_concurrent_inserts_converge() {
        let x = insert(1, "", 0, "X");
        let y = insert(2, "", 0, "Y");

        let mut alice = State::default();
        execute(&mut alice, &x);
        execute(&mut alice, &y);

        let mut bob = State::default();
        execute(&mut bob, &y);
        execute(&mut bob, &x);

        assert_eq!(alice.content().text(), "XY");
        assert_eq!(bob.content().text(), "XY");
        assert_eq!(alice.vector(), &v("1:1;2:1"));
        assert_eq!(bob.vector(), &v("1:1;2:1"));
    }

    #[test]
    fn test_three_users_converge() {
        let a = insert(1, "", 0, "a");
        let b = insert(2, "", 0, "b");
        let c = insert(3, "", 0, "c");

        for order in [[&a, &b, &c], [&c, &a, &b], [&c, &b, &a], [&b, &c, &a]] {
            let mut state = State::default();

            for request in order {
                execute(&mut state, request);
            }

            assert_eq!(state.content().text(), "abc");
        }
    }

    #[test]
    fn test_straddled_delete() {
        let base = Content::from_text(0, "abcdef");

        let delete = Request::from(DoRequest::new(
            1,
            Vector::new(),
            Delete::reversible(2, base.slice(2..5).unwrap()),
        ));
        let insert = insert(2, "", 3, "Z");

        let mut alice = State::new(base.clone(), Vector::new());
        execute(&mut alice, &delete);
        assert_eq!(alice.content().text(), "abf");
        execute(&mut alice, &insert);

        let mut bob = State::new(base, Vector::new());
        execute(&mut bob, &insert);
        assert_eq!(bob.content().text(), "abcZdef");
        execute(&mut bob, &delete);

        assert_eq!(alice.content().text(), "abZf");
        assert_eq!(bob.content().text(), "abZf");
    }

    #[test]
    fn test_undo_redo() {
        let mut state = State::new(Content::from_text(0, "ab"), Vector::new());

        state
            .local_do(1, Insert::new(1, Content::from_text(1, "xy")))
            .unwrap();
        assert_eq!(state.content().text(), "axyb");

        assert!(state.local_undo(1).unwrap().is_some());
        assert_eq!(state.content().text(), "ab");

        assert!(state.local_redo(1).unwrap().is_some());
        assert_eq!(state.content().text(), "axyb");
        assert_eq!(state.vector(), &v("1:3"));

        assert!(state.local_redo(1).unwrap().is_none());
        assert_eq!(state.vector(), &v("1:3"));
    }

    #[test]
    fn test_nothing_to_undo() {
        let mut state = State::default();

        assert_eq!(state.local_undo(1), Ok(None));
        assert_eq!(state.local_redo(1), Ok(None));
        assert!(state.log().is_empty());
    }

    #[test]
    fn test_undo_irreversible_delete() {
        let mut state = State::new(Content::from_text(0, "abcd"), Vector::new());

        state.local_do(1, Delete::irreversible(1, 2)).unwrap();
        assert_eq!(state.content().text(), "ad");

        // The log keeps a reversible copy.
        assert_eq!(
            state.log()[0],
            Request::from(DoRequest::new(
                1,
                Vector::new(),
                Delete::reversible(1, Content::from_text(0, "bc"))
            ))
        );

        state.local_undo(1).unwrap();
        assert_eq!(state.content().text(), "abcd");
    }

    #[test]
    fn test_concurrent_undo_redo() {
        let mut alice = State::default();
        let mut bob = State::default();

        let a = alice
            .local_do(1, Insert::new(0, Content::from_text(1, "a")))
            .unwrap();
        let b = bob
            .local_do(2, Insert::new(0, Content::from_text(2, "b")))
            .unwrap();

        execute(&mut alice, &b);
        execute(&mut bob, &a);
        assert_eq!(alice.content().text(), "ab");
        assert_eq!(bob.content().text(), "ab");

        let undo = alice.local_undo(1).unwrap().unwrap();
        execute(&mut bob, &undo);
        assert_eq!(alice.content().text(), "b");
        assert_eq!(bob.content().text(), "b");

        let redo = alice.local_redo(1).unwrap().unwrap();
        execute(&mut bob, &redo);
        assert_eq!(alice.content().text(), "ab");
        assert_eq!(bob.content().text(), "ab");
        assert_eq!(alice.vector(), bob.vector());
    }

    #[test]
    fn test_out_of_order_delivery() {
        let first = insert(1, "", 0, "a");
        let second = insert(1, "1:1", 1, "b");

        let mut state = State::default();
        assert_eq!(state.execute(second.clone()), Ok(Outcome::Deferred));
        assert_eq!(state.pending(), &[second]);
        assert!(state.content().is_empty());

        state.queue(first);
        let executed = state.execute_all().unwrap();

        assert_eq!(executed.len(), 2);
        assert_eq!(state.content().text(), "ab");
        assert!(state.pending().is_empty());
        assert_eq!(state.execute_next(), Ok(None));
    }

    #[test]
    fn test_translate_idempotent() {
        let x = insert(1, "", 0, "X");
        let y = insert(2, "", 0, "Y");

        let mut state = State::default();
        execute(&mut state, &x);

        let target = v("1:1");
        let translated = state.translate(&y, &target).unwrap();
        assert_eq!(translated.vector, target);
        assert_eq!(
            translated.operation,
            Operation::from(Insert::new(1, Content::from_text(2, "Y")))
        );

        let again = state
            .translate(&Request::from(translated.clone()), &target)
            .unwrap();
        assert_eq!(again, translated);
    }

    #[test]
    fn test_duplicate_delivery() {
        let x = insert(1, "", 0, "X");

        let mut state = State::default();
        execute(&mut state, &x);

        assert_eq!(state.execute(x), Ok(Outcome::Duplicate));
        assert_eq!(state.content().text(), "X");
        assert_eq!(state.vector(), &v("1:1"));
        assert_eq!(state.log().len(), 2);
    }

    #[test]
    fn test_irreversible_duplicate_rejected() {
        let mut state = State::new(Content::from_text(0, "ab"), Vector::new());
        let delete = state.local_do(1, Delete::irreversible(0, 1)).unwrap();

        assert_eq!(
            state.execute(delete),
            Err(Error::IrreversibleDuplicate {
                user: 1,
                vector: Vector::new(),
            })
        );
        assert_eq!(state.log().len(), 1);
        assert_eq!(state.content().text(), "b");
    }

    #[test]
    fn test_no_translation_path() {
        // The seeded vector claims a request by user 1 that was never logged.
        let mut state = State::new(Content::from_text(0, "ab"), v("1:1"));
        let request = insert(2, "", 0, "x");

        assert_eq!(
            state.execute(request.clone()),
            Err(Error::NoTranslationPath {
                user: 2,
                target: v("1:1"),
            })
        );
        assert_eq!(state.content().text(), "ab");
        assert_eq!(state.vector(), &v("1:1"));
        assert!(state.log().is_empty());

        state.queue(request.clone());
        assert!(state.execute_next().is_err());
        assert_eq!(state.pending(), &[request]);
    }

    #[test]
    fn test_failed_request_does_not_block_queue() {
        let mut state = State::new(Content::from_text(0, "ab"), Vector::new());
        let delete = state.local_do(1, Delete::irreversible(0, 1)).unwrap();

        state.queue(delete);
        state.queue(insert(2, "", 0, "Z"));

        assert_eq!(
            state.execute_all(),
            Err(Error::IrreversibleDuplicate {
                user: 1,
                vector: Vector::new(),
            })
        );
        assert_eq!(state.content().text(), "Zb");
        assert!(state.pending().is_empty());
        assert_eq!(state.execute_all(), Ok(Vec::new()));
    }

    #[test]
    fn test_retryable_failure_stays_queued() {
        let mut state = State::new(Content::from_text(0, "ab"), v("1:1"));
        let stranded = insert(2, "", 0, "x");

        state.queue(stranded.clone());
        state.queue(insert(1, "1:1", 0, "y"));

        assert!(state.execute_all().is_err());
        assert_eq!(state.content().text(), "yab");
        assert_eq!(state.vector(), &v("1:2"));
        assert_eq!(state.pending(), &[stranded]);
    }

    #[test]
    fn test_undo_waits_for_predecessors() {
        let mut alice = State::default();

        let first = alice
            .local_do(1, Insert::new(0, Content::from_text(1, "a")))
            .unwrap();
        let second = alice
            .local_do(1, Insert::new(0, Content::from_text(1, "b")))
            .unwrap();
        let undo = alice.local_undo(1).unwrap().unwrap();
        assert_eq!(alice.content().text(), "a");

        let mut bob = State::default();
        assert_eq!(bob.execute(undo), Ok(Outcome::Deferred));
        assert_eq!(bob.execute(second), Ok(Outcome::Deferred));
        execute(&mut bob, &first);

        // The undo refers to the second insert, not to the first one that
        // happens to be in the log already.
        bob.execute_all().unwrap();

        assert_eq!(bob.content().text(), "a");
        assert_eq!(bob.vector(), alice.vector());
        assert!(bob.pending().is_empty());
    }

    #[test]
    fn test_concurrent_irreversible_deletes_converge() {
        let mut alice = State::new(Content::from_text(0, "abcdef"), Vector::new());
        let mut bob = State::new(Content::from_text(0, "abcdef"), Vector::new());

        let ours = vec![
            alice.local_do(1, Delete::irreversible(4, 1)).unwrap(),
            alice.local_do(1, Delete::irreversible(0, 4)).unwrap(),
            alice.local_do(1, Delete::irreversible(0, 1)).unwrap(),
        ];
        let theirs = bob.local_do(2, Delete::irreversible(0, 5)).unwrap();
        assert_eq!(alice.content().text(), "");
        assert_eq!(bob.content().text(), "f");

        alice.queue(theirs);
        ours.into_iter().for_each(|request| bob.queue(request));

        assert_eq!(alice.execute_all().map(|executed| executed.len()), Ok(1));
        assert_eq!(bob.execute_all().map(|executed| executed.len()), Ok(3));

        assert_eq!(alice.content().text(), "");
        assert_eq!(bob.content().text(), "");
        assert_eq!(alice.vector(), bob.vector());

        // Alice reconstructed everything the delete would have removed from
        // the original text.
        assert_eq!(
            alice.log()[3],
            Request::from(DoRequest::new(
                2,
                Vector::new(),
                Delete::reversible(0, Content::from_text(0, "abcde"))
            ))
        );
    }

    #[test]
    fn test_reachable() {
        let mut state = State::default();
        execute(&mut state, &insert(1, "", 0, "a"));
        execute(&mut state, &insert(2, "", 0, "b"));

        assert!(state.reachable(&v("")));
        assert!(state.reachable(&v("1:1")));
        assert!(state.reachable(&v("2:1")));
        assert!(state.reachable(&v("1:1;2:1")));
        assert!(!state.reachable(&v("1:2")));
    }

    #[test]
    fn test_request_by_user() {
        let mut state = State::default();
        execute(&mut state, &insert(1, "", 0, "a"));
        execute(&mut state, &insert(1, "1:1", 1, "b"));

        assert_eq!(state.request_by_user(1, 1), Some(&state.log()[1]));
        assert_eq!(state.request_by_user(1, 2), None);
        assert_eq!(state.first_request_by_user(1), Some(&state.log()[0]));
        assert_eq!(state.first_request_by_user(2), None);
    }

    #[test]
    fn test_cache_bounded() {
        let requests = [
            insert(1, "", 0, "a"),
            insert(2, "", 0, "b"),
            insert(3, "", 0, "c"),
        ];

        let config = |cache_capacity| Config { cache_capacity };
        let mut state = State::with_config(Content::new(), Vector::new(), config(1));
        let mut uncached = State::with_config(Content::new(), Vector::new(), config(0));

        for request in &requests {
            execute(&mut state, request);
            execute(&mut uncached, request);
            assert!(state.cache.len() <= 1);
        }

        assert!(uncached.cache.is_empty());
        assert_eq!(state.content().text(), "abc");
        assert_eq!(uncached.content().text(), "abc");

        state.clear_cache();
        assert!(state.cache.is_empty());
    }

    #[test]
    fn test_on_execute() {
        let executed = Arc::new(Mutex::new(Vec::new()));

        let mut state = State::default();
        state.on_execute({
            let executed = executed.clone();
            move |request| executed.lock().unwrap().push(request.operation.to_string())
        });

        execute(&mut state, &insert(1, "", 0, "X"));
        execute(&mut state, &insert(2, "", 0, "Y"));

        assert_eq!(
            *executed.lock().unwrap(),
            vec!["Insert(0, X)".to_owned(), "Insert(1, Y)".to_owned()]
        );
    }
}
