//! Element identity: names, derived ids and the mutability gate
//!
//! Every node in a process graph carries an [`Element`]. The id is never
//! set directly; it is recomputed from the name on every rename, so
//! `id == normalize(name)` holds for the lifetime of the element.

use serde::{Deserialize, Serialize};

/// Id reserved for the undefined sentinel of every category.
pub const UNDEFINED_ID: &str = "undefined";

/// Category of an element, used for fallback names and interchange tables
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Process,
    Event,
    Condition,
    Task,
    Activity,
    Value,
    View,
    Function,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::Event => "event",
            Self::Condition => "condition",
            Self::Task => "task",
            Self::Activity => "activity",
            Self::Value => "value",
            Self::View => "view",
            Self::Function => "function",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a display name into an element id.
///
/// Trims, lowercases (Unicode-aware) and replaces whitespace with `_`.
///
/// ```
/// use process_types::normalize;
///
/// assert_eq!(normalize("  Default Task "), "default_task");
/// assert_eq!(normalize("   "), "");
/// ```
pub fn normalize(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Identity of a graph node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    kind: ElementKind,
    id: String,
    name: String,
    locked: bool,
    valid: bool,
}

impl Element {
    /// Create a free-standing, unlocked element
    pub fn new(kind: ElementKind, name: impl AsRef<str>) -> Self {
        let mut element = Self {
            kind,
            id: String::new(),
            name: String::new(),
            locked: false,
            valid: true,
        };
        element.apply_name(name.as_ref());
        element
    }

    /// The inert placeholder returned in place of a missing reference
    pub fn undefined(kind: ElementKind) -> Self {
        Self {
            kind,
            id: UNDEFINED_ID.to_string(),
            name: UNDEFINED_ID.to_string(),
            locked: false,
            valid: false,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Rename the element. Silently ignored once locked.
    ///
    /// Returns `true` when the name was applied.
    pub fn set_name(&mut self, name: impl AsRef<str>) -> bool {
        if self.locked {
            return false;
        }
        self.apply_name(name.as_ref());
        true
    }

    /// Freeze the element. Invalid elements cannot be locked.
    ///
    /// Returns whether the element is locked afterwards.
    pub fn lock(&mut self) -> bool {
        if self.valid {
            self.locked = true;
        }
        self.locked
    }

    fn apply_name(&mut self, name: &str) {
        let trimmed = name.trim();
        self.name = if trimmed.is_empty() {
            self.fallback_name()
        } else {
            trimmed.to_string()
        };
        self.id = normalize(&self.name);
    }

    fn fallback_name(&self) -> String {
        let identity = uuid::Uuid::new_v4().simple().to_string();
        format!("{}{}", self.kind.as_str(), &identity[..8])
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.kind, self.id)
    }
}
