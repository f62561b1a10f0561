use std::fmt::{self, Display};

use arbitrary::Arbitrary;
use serde::{Deserialize, Serialize};

use super::ops::Delete;
use super::{Cid, Error, Operation, Result, State, Transform, UserId, Vector};

/// Request by a user to apply an operation.
///
/// The vector is the causal time just before the request was issued, so the
/// issuing user's own component is the number of requests that user issued
/// before.
#[derive(Arbitrary, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoRequest {
    /// User that issued this request.
    pub user: UserId,

    /// Time at which this request was issued.
    pub vector: Vector,

    /// Operation to apply.
    pub operation: Operation,
}

impl DoRequest {
    /// Returns a new do-request.
    pub fn new(user: UserId, vector: Vector, operation: impl Into<Operation>) -> DoRequest {
        DoRequest {
            user,
            vector,
            operation: operation.into(),
        }
    }

    /// Applies this request's operation to the state's content and advances
    /// the state's vector at the issuing user.
    pub fn execute(&self, state: &mut State) -> Result<()> {
        self.operation.apply(&mut state.content)?;
        state.vector = state.vector.incr(self.user, 1);

        Ok(())
    }

    /// Transforms this request against another request that was issued at the
    /// same time. The concurrency id refers to the requests: [`Cid::Own`]
    /// displaces this request, [`Cid::Other`] displaces `other`.
    pub fn transform(&self, other: &DoRequest, cid: Option<Cid>) -> DoRequest {
        let operation = match &self.operation {
            Operation::NoOp => Operation::NoOp,
            operation => operation.transform(&other.operation, cid),
        };

        DoRequest {
            user: self.user,
            vector: self.vector.incr(other.user, 1),
            operation,
        }
    }

    /// Inverts the operation and advances the issuing user's component by
    /// `amount`.
    pub fn mirror(&self, amount: u64) -> Result<DoRequest> {
        Ok(DoRequest {
            user: self.user,
            vector: self.vector.incr(self.user, amount),
            operation: self.operation.mirror()?,
        })
    }

    /// Advances the given user's component by `amount` without touching the
    /// operation. Folding skips over matched undo/redo pairs, so `amount` must
    /// be a multiple of 2.
    pub fn fold(&self, user: UserId, amount: u64) -> Result<DoRequest> {
        if amount % 2 != 0 {
            return Err(Error::InvalidFold { amount });
        }

        Ok(DoRequest {
            user: self.user,
            vector: self.vector.incr(user, amount),
            operation: self.operation.clone(),
        })
    }

    /// Returns a reversible version of this request, given its translation to
    /// the state's current vector. Only requests carrying a delete change.
    pub fn make_reversible(&self, translated: &DoRequest, state: &State) -> Result<DoRequest> {
        let operation = match &self.operation {
            Operation::Delete(delete) => Operation::Delete(Delete::make_reversible(
                delete,
                &translated.operation,
                &state.content,
            )?),
            operation => operation.clone(),
        };

        Ok(DoRequest {
            operation,
            ..self.clone()
        })
    }
}

/// Request by a user to undo their last request that hasn't been undone yet.
#[derive(Arbitrary, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UndoRequest {
    /// User that issued this request.
    pub user: UserId,

    /// Time at which this request was issued.
    pub vector: Vector,
}

/// Request by a user to redo their last undone request.
#[derive(Arbitrary, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RedoRequest {
    /// User that issued this request.
    pub user: UserId,

    /// Time at which this request was issued.
    pub vector: Vector,
}

/// Do, undo or redo request.
#[derive(Arbitrary, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Request {
    /// Applies an operation. [Click here](DoRequest) to read more.
    Do(DoRequest),

    /// Undoes an earlier request. [Click here](UndoRequest) to read more.
    Undo(UndoRequest),

    /// Redoes an undone request. [Click here](RedoRequest) to read more.
    Redo(RedoRequest),
}

impl Request {
    /// Returns the user that issued this request.
    pub fn user(&self) -> UserId {
        match self {
            Request::Do(request) => request.user,
            Request::Undo(request) => request.user,
            Request::Redo(request) => request.user,
        }
    }

    /// Returns the time at which this request was issued.
    pub fn vector(&self) -> &Vector {
        match self {
            Request::Do(request) => &request.vector,
            Request::Undo(request) => &request.vector,
            Request::Redo(request) => &request.vector,
        }
    }

    /// Returns a copy of this request issued at a different time.
    pub fn with_vector(&self, vector: Vector) -> Request {
        let mut request = self.clone();

        match &mut request {
            Request::Do(request) => request.vector = vector,
            Request::Undo(request) => request.vector = vector,
            Request::Redo(request) => request.vector = vector,
        }

        request
    }

    /// Returns the number of requests the issuing user made before this one.
    pub fn sequence(&self) -> u64 {
        self.vector().get(self.user())
    }

    /// Returns true for undo and redo requests.
    pub fn is_reversal(&self) -> bool {
        !matches!(self, Request::Do(_))
    }

    /// Finds the request that this undo or redo request refers to: the
    /// do-request (or redo) an undo reverts, or the undo a redo reverts.
    ///
    /// The log is searched backwards from this request's own position (or from
    /// its end if this request isn't logged), only considering earlier
    /// requests by the same user. Nested undo/redo sequences are matched like
    /// balanced parentheses. Do-requests don't refer to anything.
    pub fn associated_request<'a>(&self, log: &'a [Request]) -> Option<&'a Request> {
        if let Request::Do(_) = self {
            return None;
        }

        let (user, sequence) = (self.user(), self.sequence());
        let end = log.iter().position(|entry| entry == self).unwrap_or(log.len());
        let mut depth = 1usize;

        for entry in log[..end].iter().rev() {
            if entry.user() != user || entry.vector().get(user) > sequence {
                continue;
            }

            match (self, entry) {
                (Request::Undo(_), Request::Undo(_)) | (Request::Redo(_), Request::Redo(_)) => {
                    depth += 1;
                }
                // A new edit since the last undo leaves nothing to redo.
                (Request::Redo(_), Request::Do(_)) => return None,
                _ => depth -= 1,
            }

            if depth == 0 {
                return Some(entry);
            }
        }

        None
    }
}

impl From<DoRequest> for Request {
    fn from(value: DoRequest) -> Self {
        Self::Do(value)
    }
}

impl From<UndoRequest> for Request {
    fn from(value: UndoRequest) -> Self {
        Self::Undo(value)
    }
}

impl From<RedoRequest> for Request {
    fn from(value: RedoRequest) -> Self {
        Self::Redo(value)
    }
}

impl Display for DoRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Do({}, {}, {})", self.user, self.vector, self.operation)
    }
}

impl Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Do(request) => request.fmt(f),
            Request::Undo(request) => write!(f, "Undo({}, {})", request.user, request.vector),
            Request::Redo(request) => write!(f, "Redo({}, {})", request.user, request.vector),
        }
    }
}
