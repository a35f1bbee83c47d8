use serde::Serialize;

use certreg_core::ServiceError;

use super::RegistryService;
use crate::classify::{self, Classification};
use crate::model::Student;

/// The detail view payload: a student plus their classification
/// against the required-code list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProgress {
    pub student: Student,

    #[serde(flatten)]
    pub classification: Classification,
}

impl RegistryService {
    /// Classify one student's certifications against the configured
    /// required codes.
    pub fn student_progress(&self, slug: &str) -> Result<StudentProgress, ServiceError> {
        let student = self.get_student(slug)?;
        let certs = self.certifications_of(&student.id)?;
        let courses = self.courses_by_codes(&self.config().required_certs)?;

        let classification = classify::classify(&certs, &courses, self.config());

        Ok(StudentProgress {
            student,
            classification,
        })
    }

    /// Display names for the required codes: the course name when the
    /// course exists, else the raw code. Order follows the config.
    pub fn required_names(&self) -> Result<Vec<String>, ServiceError> {
        let courses = self.courses_by_codes(&self.config().required_certs)?;
        Ok(self
            .config()
            .required_certs
            .iter()
            .map(|code| {
                courses
                    .get(code)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| code.clone())
            })
            .collect())
    }
}
