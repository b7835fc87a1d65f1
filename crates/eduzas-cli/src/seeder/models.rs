//! Seed rows and seeding configuration.

use eduzas_auth::Role;
use uuid::Uuid;

pub struct UserSeed {
    pub first_name: String,
    pub father_lastname: String,
    pub mother_lastname: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

pub struct ClassSeed {
    pub code: String,
    pub class_name: String,
    pub subject: String,
    pub section: String,
    pub owner_id: Uuid,
}

#[derive(Clone, Debug)]
pub struct SeedConfig {
    pub professors: usize,
    pub students: usize,
    pub classes: usize,
    pub students_per_class: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            professors: 5,
            students: 100,
            classes: 10,
            students_per_class: 20,
        }
    }
}

impl SeedConfig {
    pub fn new(professors: usize, students: usize) -> Self {
        Self {
            professors,
            students,
            ..Default::default()
        }
    }

    pub fn with_classes(mut self, classes: usize, students_per_class: usize) -> Self {
        self.classes = classes;
        self.students_per_class = students_per_class;
        self
    }

    /// Enrollments actually created: a class cannot take more students than exist.
    pub fn total_enrollments(&self) -> usize {
        if self.professors == 0 {
            return 0;
        }
        self.classes * self.students_per_class.min(self.students)
    }
}
