//! Function references: serializable handles to registered behavior
//!
//! A reference names a predicate, comparison or action by a three-part
//! key. The engine resolves it against a registry at evaluation time;
//! graphs never embed closures.

use serde::{Deserialize, Serialize};

/// `(module, member, scope)` key of a registered behavior
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionRef {
    pub module: String,
    pub member: String,
    pub scope: String,
}

impl FunctionRef {
    pub fn new(
        module: impl Into<String>,
        member: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            member: member.into(),
            scope: scope.into(),
        }
    }

    /// A reference that no registry entry can match
    pub fn undefined() -> Self {
        Self::new("", "", "")
    }

    pub fn is_undefined(&self) -> bool {
        self.module.is_empty() && self.member.is_empty() && self.scope.is_empty()
    }
}

impl std::fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}@{}", self.module, self.member, self.scope)
    }
}
