//! Relationship resolution.
//!
//! A [`Chain`] is the minimal slice of the entity graph a request touches:
//! the target plus every ancestor up to its school. [`resolve`] walks it once
//! and reports how the actor is connected. An empty [`RelationshipSet`]
//! means unrelated, and every mutation rule treats that as a denial.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};

use classbook_models::{
    Assignment, AssignmentId, Class, ClassId, News, NewsId, School, SchoolId, Solution,
    SolutionId, UserId,
};

use crate::identity::ActorContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Relationship {
    /// Authored the resource (own solution, own news item).
    Creator,
    /// Teaches the class the resource hangs off.
    TeacherOf,
    /// Attends the class the resource hangs off.
    StudentOf,
    /// Manages the school the resource hangs off.
    ManagerOf,
    /// Teaches or attends some class of the school. Only derived for
    /// school-level resources, never for class-level ones.
    MemberOfSchool,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Creator => "creator",
            Relationship::TeacherOf => "teacher-of",
            Relationship::StudentOf => "student-of",
            Relationship::ManagerOf => "manager-of",
            Relationship::MemberOfSchool => "member-of-school",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipSet(BTreeSet<Relationship>);

impl RelationshipSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, relationship: Relationship) {
        self.0.insert(relationship);
    }

    pub fn contains(&self, relationship: Relationship) -> bool {
        self.0.contains(&relationship)
    }

    pub fn is_unrelated(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Relationship> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Relationship> for RelationshipSet {
    fn from_iter<I: IntoIterator<Item = Relationship>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for RelationshipSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unrelated() {
            return f.write_str("unrelated");
        }
        let tags: Vec<&str> = self.iter().map(|r| r.as_str()).collect();
        f.write_str(&tags.join(","))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    School,
    Class,
    Assignment,
    Solution,
    News,
}

impl ResourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::School => "School",
            ResourceKind::Class => "Class",
            ResourceKind::Assignment => "Assignment",
            ResourceKind::Solution => "Solution",
            ResourceKind::News => "News",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A target entity by id, before loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    School(SchoolId),
    Class(ClassId),
    Assignment(AssignmentId),
    Solution(SolutionId),
    News(NewsId),
}

impl ResourceRef {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRef::School(_) => ResourceKind::School,
            ResourceRef::Class(_) => ResourceKind::Class,
            ResourceRef::Assignment(_) => ResourceKind::Assignment,
            ResourceRef::Solution(_) => ResourceKind::Solution,
            ResourceRef::News(_) => ResourceKind::News,
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::School(id) => write!(f, "school:{}", id),
            ResourceRef::Class(id) => write!(f, "class:{}", id),
            ResourceRef::Assignment(id) => write!(f, "assignment:{}", id),
            ResourceRef::Solution(id) => write!(f, "solution:{}", id),
            ResourceRef::News(id) => write!(f, "news:{}", id),
        }
    }
}

/// A loaded target with the ancestors needed to resolve relationships.
#[derive(Debug, Clone, PartialEq)]
pub enum Chain {
    School(School),
    Class(Class),
    Assignment {
        assignment: Assignment,
        class: Class,
    },
    Solution {
        solution: Solution,
        assignment: Assignment,
        class: Class,
    },
    /// `class` is set for class-scoped news, `None` for school-scoped news.
    News {
        news: News,
        class: Option<Class>,
        school_id: SchoolId,
    },
}

impl Chain {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Chain::School(_) => ResourceKind::School,
            Chain::Class(_) => ResourceKind::Class,
            Chain::Assignment { .. } => ResourceKind::Assignment,
            Chain::Solution { .. } => ResourceKind::Solution,
            Chain::News { .. } => ResourceKind::News,
        }
    }

    pub fn target(&self) -> ResourceRef {
        match self {
            Chain::School(school) => ResourceRef::School(school.id),
            Chain::Class(class) => ResourceRef::Class(class.id),
            Chain::Assignment { assignment, .. } => ResourceRef::Assignment(assignment.id),
            Chain::Solution { solution, .. } => ResourceRef::Solution(solution.id),
            Chain::News { news, .. } => ResourceRef::News(news.id),
        }
    }

    pub fn school_id(&self) -> SchoolId {
        match self {
            Chain::School(school) => school.id,
            Chain::Class(class)
            | Chain::Assignment { class, .. }
            | Chain::Solution { class, .. } => class.school_id,
            Chain::News { school_id, .. } => *school_id,
        }
    }

    pub fn class(&self) -> Option<&Class> {
        match self {
            Chain::School(_) => None,
            Chain::Class(class)
            | Chain::Assignment { class, .. }
            | Chain::Solution { class, .. } => Some(class),
            Chain::News { class, .. } => class.as_ref(),
        }
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            Chain::Assignment { assignment, .. } | Chain::Solution { assignment, .. } => {
                Some(assignment)
            }
            _ => None,
        }
    }

    /// The deadline temporal policies compare against.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.assignment().map(|a| a.deadline)
    }

    pub fn creator(&self) -> Option<UserId> {
        match self {
            Chain::Solution { solution, .. } => Some(solution.student_id),
            Chain::News { news, .. } => Some(news.creator_id),
            _ => None,
        }
    }
}

/// Computes how `actor` relates to the resource at the end of `chain`.
///
/// Pure and read-only; the chain is already loaded.
pub fn resolve(actor: &ActorContext, chain: &Chain) -> RelationshipSet {
    let mut set = RelationshipSet::new();
    let user_id = actor.id();

    if chain.creator() == Some(user_id) {
        set.insert(Relationship::Creator);
    }

    if let Some(class) = chain.class() {
        if class.is_taught_by(user_id) {
            set.insert(Relationship::TeacherOf);
        }
        if class.has_student(user_id) {
            set.insert(Relationship::StudentOf);
        }
    }

    let school_id = chain.school_id();
    let school_manager = match chain {
        Chain::School(school) => school.manager_id == Some(user_id),
        _ => false,
    };
    if school_manager || actor.manages(school_id) {
        set.insert(Relationship::ManagerOf);
    }

    let school_level = matches!(
        chain,
        Chain::School(_) | Chain::News { class: None, .. }
    );
    if school_level && actor.belongs_to_school(school_id) {
        set.insert(Relationship::MemberOfSchool);
    }

    set
}
