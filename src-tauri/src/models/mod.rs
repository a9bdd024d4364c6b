pub mod classify_types;
pub mod ui_types;
