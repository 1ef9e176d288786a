pub mod brush;
pub mod filters;
