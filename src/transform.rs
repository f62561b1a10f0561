use std::cmp::Ordering;

use super::ops::{Delete, Extent, Insert, Split};
use super::{Cid, Content, Len, Operation, Recon};

/// Implemented by operations that can be transformed against another
/// operation, producing the operation that achieves the same intended effect
/// as the receiver had the other operation already been applied.
///
/// The table below contains links to the implementation notes of
/// [`Transform`] for each pair of operations. The rows represent Alice's
/// operations (i.e. the receiver) and the columns represent Bob's operations
/// (i.e. the operation that has already been applied).
///
/// | ↱      | Insert    | Delete    | Split     |
/// |:-------|:----------|:----------|:----------|
/// | Insert | [Impl][1] | [Impl][2] | [Impl][3] |
/// | Delete | [Impl][4] | [Impl][5] | [Impl][6] |
/// | Split  | [Impl][7] | [Impl][7] | [Impl][7] |
///
/// Transforming a no-op yields a no-op, and transforming against a no-op
/// yields the receiver unchanged.
///
/// [1]: #impl-Transform<%26Insert>-for-%26Insert
/// [2]: #impl-Transform<%26Delete>-for-%26Insert
/// [3]: #impl-Transform<%26Split>-for-%26Insert
/// [4]: #impl-Transform<%26Insert>-for-%26Delete
/// [5]: #impl-Transform<%26Delete>-for-%26Delete
/// [6]: #impl-Transform<%26Split>-for-%26Delete
/// [7]: #impl-Transform<%26Operation>-for-%26Split
pub trait Transform<Rhs> {
    /// Output type that transforming the receiver produces.
    type Output;

    /// Transforms the receiver against the given value. The concurrency id
    /// decides which operation is displaced if both touch the same position.
    fn transform(self, rhs: Rhs, cid: Option<Cid>) -> Self::Output;
}

/// Alice and Bob are both inserting. If Alice's position is before Bob's, her
/// insert is unaffected. If it's after Bob's, Alice has to skip over Bob's
/// text. If both insert at the same position, Alice only skips over Bob's
/// text if she is the one being displaced.
impl Transform<&Insert> for &Insert {
    type Output = Insert;

    fn transform(self, rhs: &Insert, cid: Option<Cid>) -> Self::Output {
        let displaced = match self.position.cmp(&rhs.position) {
            Ordering::Less => false,
            Ordering::Greater => true,
            Ordering::Equal => cid == Some(Cid::Own),
        };

        match displaced {
            true => Insert::new(self.position + rhs.len(), self.content.clone()),
            false => self.clone(),
        }
    }
}

/// Alice is inserting while Bob is deleting. If Alice's position is after
/// Bob's range, it moves back by the length of that range. If it's inside of
/// Bob's range, Alice's text ends up where Bob's range used to start.
impl Transform<&Delete> for &Insert {
    type Output = Insert;

    fn transform(self, rhs: &Delete, _cid: Option<Cid>) -> Self::Output {
        let (pos1, pos2, len2) = (self.position, rhs.position, rhs.len());

        if pos1 >= pos2 + len2 {
            Insert::new(pos1 - len2, self.content.clone())
        } else if pos1 < pos2 {
            self.clone()
        } else {
            Insert::new(pos2, self.content.clone())
        }
    }
}

/// Alice is inserting while Bob applied a split. Alice's insert is
/// transformed against Bob's first component and then against Bob's second
/// component (which is itself transformed against the first).
impl Transform<&Split> for &Insert {
    type Output = Insert;

    fn transform(self, rhs: &Split, cid: Option<Cid>) -> Self::Output {
        let cid = Some(cid.unwrap_or(Cid::Other));
        let first = self.transform(&*rhs.first, cid);

        (&first).transform(&rhs.second_after_first(), cid)
    }
}

impl Transform<&Operation> for &Insert {
    type Output = Insert;

    fn transform(self, rhs: &Operation, cid: Option<Cid>) -> Self::Output {
        match rhs {
            Operation::NoOp => self.clone(),
            Operation::Insert(rhs) => self.transform(rhs, cid),
            Operation::Delete(rhs) => self.transform(rhs, cid),
            Operation::Split(rhs) => self.transform(rhs, cid),
        }
    }
}

/// Alice is deleting while Bob is inserting. If Bob's text lands after
/// Alice's range, nothing changes. If it lands at or before the start of
/// Alice's range, her range moves forward. If it lands inside Alice's range,
/// Bob's text must survive, so Alice's delete is split around it.
impl Transform<&Insert> for &Delete {
    type Output = Operation;

    fn transform(self, rhs: &Insert, _cid: Option<Cid>) -> Self::Output {
        let (pos1, len1, pos2, len2) = (self.position, self.len(), rhs.position, rhs.len());

        if pos2 >= pos1 + len1 {
            self.clone().into()
        } else if pos2 <= pos1 {
            Delete {
                position: pos1 + len2,
                ..self.clone()
            }
            .into()
        } else {
            let (first, mut second) = self.split(pos2 - pos1);
            second.position += len2;

            Split::new(first, second).into()
        }
    }
}

/// Returns the ledger extended with the given range of Bob's removed content
/// (if Bob's delete knows what it removed).
fn record(
    recon: &Recon,
    offset: usize,
    removed: Option<&Content>,
    begin: usize,
    end: usize,
) -> Recon {
    match removed {
        Some(removed) => recon.update(offset, &removed.extract(begin, end)),
        None => recon.clone(),
    }
}

/// Alice and Bob are both deleting. Whatever part of Alice's range Bob
/// already removed is dropped from Alice's delete and kept in its recon
/// ledger.
impl Transform<&Delete> for &Delete {
    type Output = Delete;

    fn transform(self, rhs: &Delete, _cid: Option<Cid>) -> Self::Output {
        let (pos1, len1, pos2, len2) = (self.position, self.len(), rhs.position, rhs.len());
        let removed = rhs.removed();

        if pos1 + len1 <= pos2 {
            // 1XXXX|
            //        2----|
            self.clone()
        } else if pos1 >= pos2 + len2 {
            //        1XXXX|
            // 2----|
            Delete {
                position: pos1 - len2,
                ..self.clone()
            }
        } else if pos2 <= pos1 && pos2 + len2 >= pos1 + len1 {
            //     1XXXXX|
            // 2-------------|
            let extent = match self.extent {
                Extent::Content(_) => Extent::Content(Content::new()),
                Extent::Count(_) => Extent::Count(0),
            };

            Delete {
                position: pos2,
                extent,
                recon: record(&self.recon, 0, removed, pos1 - pos2, pos1 - pos2 + len1),
            }
        } else if pos2 <= pos1 {
            //     1XXXX----|
            // 2--------|
            let (_, second) = self.split(pos2 + len2 - pos1);

            Delete {
                position: pos2,
                extent: second.extent,
                recon: record(&self.recon, 0, removed, pos1 - pos2, len2),
            }
        } else if pos2 + len2 >= pos1 + len1 {
            // 1----XXXXX|
            //     2--------|
            let (first, _) = self.split(pos2 - pos1);
            let offset = first.len();

            Delete {
                recon: record(&self.recon, offset, removed, 0, pos1 + len1 - pos2),
                ..first
            }
        } else {
            // 1-----XXXXXX---|
            //      2------|
            let (first, rest) = self.split(pos2 - pos1);
            let (_, last) = rest.split(len2);

            // Both halves come from the same delete, so they are equally
            // reversible.
            Delete {
                recon: record(&self.recon, pos2 - pos1, removed, 0, len2),
                ..first.concat(&last)
            }
        }
    }
}

/// Alice is deleting while Bob applied a split. Alice's delete is transformed
/// against both of Bob's components in order.
impl Transform<&Split> for &Delete {
    type Output = Operation;

    fn transform(self, rhs: &Split, cid: Option<Cid>) -> Self::Output {
        let cid = Some(cid.unwrap_or(Cid::Other));
        let first = self.transform(&*rhs.first, cid);

        (&first).transform(&rhs.second_after_first(), cid)
    }
}

impl Transform<&Operation> for &Delete {
    type Output = Operation;

    fn transform(self, rhs: &Operation, cid: Option<Cid>) -> Self::Output {
        match rhs {
            Operation::NoOp => self.clone().into(),
            Operation::Insert(rhs) => self.transform(rhs, cid),
            Operation::Delete(rhs) => self.transform(rhs, cid).into(),
            Operation::Split(rhs) => self.transform(rhs, cid),
        }
    }
}

/// Alice applied a split. Both of her components are transformed against
/// Bob's operation individually.
impl Transform<&Operation> for &Split {
    type Output = Split;

    fn transform(self, rhs: &Operation, cid: Option<Cid>) -> Self::Output {
        Split::new(
            (&*self.first).transform(rhs, cid),
            (&*self.second).transform(rhs, cid),
        )
    }
}

impl Transform<&Operation> for &Operation {
    type Output = Operation;

    fn transform(self, rhs: &Operation, cid: Option<Cid>) -> Self::Output {
        match self {
            Operation::NoOp => Operation::NoOp,
            Operation::Insert(lhs) => lhs.transform(rhs, cid).into(),
            Operation::Delete(lhs) => lhs.transform(rhs, cid),
            Operation::Split(lhs) => lhs.transform(rhs, cid).into(),
        }
    }
}
