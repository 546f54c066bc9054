pub mod document;
pub mod surface;
