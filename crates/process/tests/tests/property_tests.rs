#[path = "property/element_ids.rs"]
mod element_ids;

#[path = "property/value_cells.rs"]
mod value_cells;

#[path = "property/rules.rs"]
mod rules;
