#![warn(missing_docs)]
//! Operational transformation engine for real-time collaborative text editing
//! with multi-user undo and redo.
//!
//! Every participant keeps a [`State`] of the shared document. Edits are
//! wrapped in [requests](Request) that carry the causal time ([`Vector`]) at
//! which they were issued. A state accepts requests in any order: requests
//! whose causal predecessors are still missing wait in its queue, and every
//! executable request is translated to the state's current time before it is
//! applied. All replicas converge to the same content regardless of delivery
//! order.
//!
//! Transport, user id assignment and persistence are left to the caller: this
//! library only consumes and produces requests.
//!
//! # Usage
//!
//! ```
//! use tandem::ops::Insert;
//! use tandem::{Content, State, Vector};
//!
//! let mut alice = State::new(Content::from_text(0, "Hello World"), Vector::new());
//! let mut bob = State::new(Content::from_text(0, "Hello World"), Vector::new());
//!
//! let comma = alice.local_do(1, Insert::new(5, Content::from_text(1, ","))).unwrap();
//! let bang = bob.local_do(2, Insert::new(11, Content::from_text(2, "!"))).unwrap();
//!
//! alice.execute(bang).unwrap();
//! bob.execute(comma).unwrap();
//!
//! assert_eq!(alice.content().text(), "Hello, World!");
//! assert_eq!(bob.content().text(), "Hello, World!");
//! ```
//!
//! ## Acknowledgements
//!
//! The transformation rules and the translation algorithm follow the adOPTed
//! algorithm as used by the [Infinote](http://infinote.org/) protocol.

mod config;
mod content;
mod error;
mod op;
pub mod ops;
mod recon;
mod request;
mod seq;
mod state;
mod transform;
mod vector;

pub use config::Config;
pub use content::{Content, Segment};
pub use error::Error;
pub use op::{Cid, Operation};
pub use recon::{Recon, ReconSegment};
pub use request::{DoRequest, RedoRequest, Request, UndoRequest};
pub use seq::Len;
pub use state::{Outcome, State};
pub use transform::Transform;
pub use vector::{UserId, Vector};

/// Result type of fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;
