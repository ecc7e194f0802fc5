//! Value table entries: buffered cells and computed views

use crate::view::View;
use process_types::{Element, ValueCell};
use serde::{Deserialize, Serialize};

/// Storage behind a [`crate::ValueId`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ValueKind {
    Cell(ValueCell),
    View(View),
}

/// A named value in the graph arena
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValueNode {
    pub(crate) element: Element,
    pub(crate) kind: ValueKind,
}

impl ValueNode {
    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn cell(&self) -> Option<&ValueCell> {
        match &self.kind {
            ValueKind::Cell(cell) => Some(cell),
            ValueKind::View(_) => None,
        }
    }

    pub fn view(&self) -> Option<&View> {
        match &self.kind {
            ValueKind::View(view) => Some(view),
            ValueKind::Cell(_) => None,
        }
    }

    pub fn is_view(&self) -> bool {
        matches!(self.kind, ValueKind::View(_))
    }

    /// A cell with a write waiting for commit
    pub fn is_modified(&self) -> bool {
        self.cell().map(ValueCell::is_modified).unwrap_or(false)
    }
}
