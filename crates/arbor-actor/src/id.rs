use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque string identifying one entity within its kind.
///
/// Entities map their natural key to an `ActorId` deterministically: a
/// snapshot by its directory id, a reference by its reference id, and name
/// lookups by a [`composite`](ActorId::composite) of the name and its scope.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Separator used by [`ActorId::composite`].
    pub const DELIMITER: char = '|';

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Join the parts of a composite key, e.g. `[repository, branch-name]`.
    pub fn composite<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut id = String::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                id.push(Self::DELIMITER);
            }
            id.push_str(part.as_ref());
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ActorId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ActorId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_joins_with_delimiter() {
        let id = ActorId::composite(["owner", "repo", "main"]);
        assert_eq!(id.as_str(), "owner|repo|main");
    }

    #[test]
    fn composite_of_one_part_is_the_part() {
        assert_eq!(ActorId::composite(["solo"]), ActorId::from("solo"));
    }

    #[test]
    fn composite_is_deterministic() {
        let parts = vec!["org".to_string(), "name".to_string()];
        assert_eq!(ActorId::composite(&parts), ActorId::composite(&parts));
    }
}
