use std::cmp::max;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use arbitrary::{Arbitrary, Unstructured};
use serde::{Deserialize, Serialize};

use super::Error;

/// Identifies a participant of an editing session.
pub type UserId = u32;

/// Causal timestamp with one counter per participant.
///
/// Absent participants count as zero and zero-valued components are never
/// stored, so two vectors compare equal iff all of their components match.
/// Every mutator returns a new vector.
///
/// The compact text encoding lists `user:count` pairs sorted by user and
/// separated by semicolons, e.g. `"1:2;3:4"`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Vector {
    components: BTreeMap<UserId, u64>,
}

impl Vector {
    /// Returns a new vector in which every component is zero.
    pub fn new() -> Vector {
        Vector::default()
    }

    /// Returns the given user's component, or 0 if it is absent.
    pub fn get(&self, user: UserId) -> u64 {
        self.components.get(&user).copied().unwrap_or_default()
    }

    /// Iterates over the users with a non-zero component in ascending order.
    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.components.keys().copied()
    }

    /// Iterates over all non-zero components in ascending user order.
    pub fn iter(&self) -> impl Iterator<Item = (UserId, u64)> + '_ {
        self.components.iter().map(|(&user, &count)| (user, count))
    }

    /// Returns a copy of this vector with the given user's component replaced.
    pub fn set(&self, user: UserId, count: u64) -> Vector {
        let mut result = self.clone();

        match count {
            0 => result.components.remove(&user),
            count => result.components.insert(user, count),
        };

        result
    }

    /// Returns a copy of this vector with the given user's component
    /// increased by `by`.
    pub fn incr(&self, user: UserId, by: u64) -> Vector {
        self.set(user, self.get(user) + by)
    }

    /// Returns a copy of this vector with the given user's component
    /// decreased by `by`, or `None` if that would make it negative.
    pub fn decr(&self, user: UserId, by: u64) -> Option<Vector> {
        self.get(user)
            .checked_sub(by)
            .map(|count| self.set(user, count))
    }

    /// Returns the component-wise sum of both vectors.
    pub fn add(&self, other: &Vector) -> Vector {
        other
            .iter()
            .fold(self.clone(), |result, (user, count)| result.incr(user, count))
    }

    /// Returns true if every component of this vector is less than or equal
    /// to the corresponding component of `other`.
    pub fn causally_before(&self, other: &Vector) -> bool {
        self.iter().all(|(user, count)| count <= other.get(user))
    }

    /// Returns the smallest vector that is causally after both vectors, i.e.
    /// their component-wise maximum.
    pub fn least_common_successor(&self, other: &Vector) -> Vector {
        other.iter().fold(self.clone(), |result, (user, count)| {
            let count = max(result.get(user), count);
            result.set(user, count)
        })
    }
}

impl Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (user, count)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(";")?;
            }

            write!(f, "{user}:{count}")?;
        }

        Ok(())
    }
}

impl FromStr for Vector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidVector(s.to_owned());

        s.split(';')
            .filter(|pair| !pair.is_empty())
            .try_fold(Vector::new(), |result, pair| {
                let (user, count) = pair.split_once(':').ok_or_else(invalid)?;
                let user = user.trim().parse().map_err(|_| invalid())?;
                let count = count.trim().parse().map_err(|_| invalid())?;

                Ok(result.set(user, count))
            })
    }
}

impl From<Vector> for String {
    fn from(value: Vector) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Vector {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromIterator<(UserId, u64)> for Vector {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (UserId, u64)>,
    {
        iter.into_iter()
            .fold(Vector::new(), |result, (user, count)| result.incr(user, count))
    }
}

impl<'a> Arbitrary<'a> for Vector {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let pairs = Vec::<(u8, u8)>::arbitrary(u)?;

        Ok(pairs
            .into_iter()
            .map(|(user, count)| (user as UserId, count as u64))
            .collect())
    }
}
