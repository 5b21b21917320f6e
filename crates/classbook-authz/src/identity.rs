//! The acting user together with the organizational memberships the
//! relationship resolver needs.

use classbook_models::{ClassId, Role, SchoolId, User, UserId};

/// A class the actor teaches or attends, with the school that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassMembership {
    pub class_id: ClassId,
    pub school_id: SchoolId,
}

/// Everything known about the actor for the span of one request.
///
/// Loaded fresh from the store per request, so role and activation changes
/// take effect without waiting for token expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorContext {
    pub user: User,
    pub managed_school: Option<SchoolId>,
    pub taught_classes: Vec<ClassMembership>,
    pub attended_classes: Vec<ClassMembership>,
}

impl ActorContext {
    /// An actor with no memberships at all.
    pub fn bare(user: User) -> Self {
        Self {
            user,
            managed_school: None,
            taught_classes: Vec::new(),
            attended_classes: Vec::new(),
        }
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn is_active(&self) -> bool {
        self.user.is_active
    }

    pub fn manages(&self, school_id: SchoolId) -> bool {
        self.managed_school == Some(school_id)
    }

    pub fn teaches(&self, class_id: ClassId) -> bool {
        self.taught_classes.iter().any(|m| m.class_id == class_id)
    }

    pub fn attends(&self, class_id: ClassId) -> bool {
        self.attended_classes.iter().any(|m| m.class_id == class_id)
    }

    /// Teaches or attends some class of the school.
    pub fn belongs_to_school(&self, school_id: SchoolId) -> bool {
        self.taught_classes
            .iter()
            .chain(self.attended_classes.iter())
            .any(|m| m.school_id == school_id)
    }

    /// Classes the actor teaches or attends, deduplicated.
    pub fn class_ids(&self) -> Vec<ClassId> {
        let mut ids: Vec<ClassId> = self
            .taught_classes
            .iter()
            .chain(self.attended_classes.iter())
            .map(|m| m.class_id)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Schools the actor manages or has a class in, deduplicated.
    pub fn school_ids(&self) -> Vec<SchoolId> {
        let mut ids: Vec<SchoolId> = self
            .taught_classes
            .iter()
            .chain(self.attended_classes.iter())
            .map(|m| m.school_id)
            .chain(self.managed_school)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
