//! Narrowing of student listings by class, status and name text.

use crate::api::{NewStudent, Student, StudentStatus};

/// Fields a student listing can be filtered on.
pub trait Filterable {
    fn filter_name(&self) -> &str;
    fn filter_class(&self) -> Option<i64>;
    fn filter_status(&self) -> StudentStatus;
}

impl Filterable for Student {
    fn filter_name(&self) -> &str {
        &self.name
    }

    fn filter_class(&self) -> Option<i64> {
        self.class_id
    }

    fn filter_status(&self) -> StudentStatus {
        self.status
    }
}

impl Filterable for NewStudent {
    fn filter_name(&self) -> &str {
        self.name()
    }

    fn filter_class(&self) -> Option<i64> {
        self.class_id()
    }

    fn filter_status(&self) -> StudentStatus {
        self.status()
    }
}

/// Conditions combined with AND; an unset condition matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFilter {
    pub class_id: Option<i64>,
    pub status: Option<StudentStatus>,
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
}

impl StudentFilter {
    #[must_use]
    pub fn new(class_id: Option<i64>, status: Option<StudentStatus>, search: Option<String>) -> Self {
        let search = search
            .map(|text| text.trim().to_lowercase())
            .filter(|text| !text.is_empty());
        Self {
            class_id,
            status,
            search,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.class_id.is_none() && self.status.is_none() && self.search.is_none()
    }

    #[must_use]
    pub fn matches(&self, item: &impl Filterable) -> bool {
        if self.class_id.is_some() && item.filter_class() != self.class_id {
            return false;
        }
        if self.status.is_some_and(|status| item.filter_status() != status) {
            return false;
        }
        match self.search.as_deref() {
            Some(text) => item.filter_name().to_lowercase().contains(text),
            None => true,
        }
    }
}
