pub mod non_conforming;
pub mod resume;
