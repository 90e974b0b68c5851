pub mod courses;
pub mod lectures;
