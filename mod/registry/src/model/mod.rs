pub mod certification;
pub mod course;
pub mod student;

pub use certification::{CertSource, Certification};
pub use course::Course;
pub use student::Student;
