#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tandem::ops::{Delete, Insert};
use tandem::{Content, Len, Operation, State, UserId, Vector};

#[derive(Arbitrary, Debug)]
enum Edit {
    Insert(u8, String),
    Delete(u8, u8),
    Undo,
    Redo,
}

fn edit(state: &mut State, user: UserId, edits: Vec<Edit>) -> Vec<tandem::Request> {
    let mut issued = Vec::new();

    for edit in edits {
        let len = state.content().len();

        let operation: Operation = match edit {
            Edit::Insert(position, text) => {
                let position = position as usize % (len + 1);
                Insert::new(position, Content::from_text(user, text)).into()
            }
            Edit::Delete(_, _) if len == 0 => continue,
            Edit::Delete(position, count) => {
                let position = position as usize % len;
                let count = count as usize % (len - position) + 1;
                Delete::irreversible(position, count).into()
            }
            Edit::Undo => {
                issued.extend(state.local_undo(user).unwrap());
                continue;
            }
            Edit::Redo => {
                issued.extend(state.local_redo(user).unwrap());
                continue;
            }
        };

        issued.push(state.local_do(user, operation).unwrap());
    }

    issued
}

fuzz_target!(|data: (String, Vec<Edit>, Vec<Edit>)| {
    let base = Content::from_text(0, data.0);

    let mut alice = State::new(base.clone(), Vector::new());
    let mut bob = State::new(base, Vector::new());

    let from_alice = edit(&mut alice, 1, data.1);
    let from_bob = edit(&mut bob, 2, data.2);

    for request in from_bob {
        alice.queue(request);
    }

    for request in from_alice {
        bob.queue(request);
    }

    alice.execute_all().unwrap();
    bob.execute_all().unwrap();

    assert_eq!(alice.vector(), bob.vector());
    assert_eq!(alice.content().text(), bob.content().text());
});
