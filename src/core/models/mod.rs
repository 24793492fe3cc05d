pub mod institute;
pub mod student;
