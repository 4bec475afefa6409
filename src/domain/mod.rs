pub mod entities;
pub mod errors;
pub mod sanitization;
pub mod value_objects;
