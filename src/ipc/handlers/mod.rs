pub mod backup;
pub mod classes;
pub mod core;
pub mod exams;
pub mod grading;
pub mod marks;
pub mod reports;
pub mod results;
pub mod settings;
pub mod students;
pub mod subjects;
