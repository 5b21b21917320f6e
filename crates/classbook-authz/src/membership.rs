//! Guards for class membership edits.
//!
//! Each edit resolves its secondary entity first (student by national id,
//! lesson by name), then checks the set operation against the class as
//! loaded. The store repeats the membership check when it commits.

use classbook_core::Rejection;
use classbook_models::{Class, Lesson, NationalId, Role, User};

pub const LESSON_NAME_MAX: usize = 255;

/// Parses the national id from a membership request body.
pub fn national_id(raw: Option<&str>) -> Result<NationalId, Rejection> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Rejection::validation("The national id is required."))?;
    Ok(NationalId::new(raw)?)
}

/// The looked-up user must exist and be a student.
pub fn student(found: Option<User>, national_id: &NationalId) -> Result<User, Rejection> {
    match found {
        Some(user) if user.role == Role::Student => Ok(user),
        _ => Err(Rejection::not_found(format!(
            "The student with this national_id = {} does not exist or is not a student.",
            national_id
        ))),
    }
}

pub fn add_student(class: &Class, student: &User) -> Result<(), Rejection> {
    if class.has_student(student.id) {
        return Err(already_member());
    }
    Ok(())
}

pub fn remove_student(class: &Class, student: &User) -> Result<(), Rejection> {
    if !class.has_student(student.id) {
        return Err(not_member());
    }
    Ok(())
}

pub(crate) fn already_member() -> Rejection {
    Rejection::conflict("The student was already in this class.")
}

pub(crate) fn not_member() -> Rejection {
    Rejection::conflict("The student was not in this class.")
}

pub(crate) fn lesson_already_offered() -> Rejection {
    Rejection::conflict("This lesson is already offered by this class.")
}

/// Parses a lesson name. Names are trimmed and compared exactly.
pub fn lesson_name(raw: Option<&str>) -> Result<String, Rejection> {
    let name = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Rejection::validation("The lesson name is required."))?;

    if name.chars().count() > LESSON_NAME_MAX {
        return Err(Rejection::validation(format!(
            "The lesson name must be at most {} characters.",
            LESSON_NAME_MAX
        )));
    }
    Ok(name.to_string())
}

/// `existing` is the catalog entry with the requested name, if any. A new
/// name is always addable since the lesson will be created with the edit.
pub fn add_lesson(class: &Class, existing: Option<&Lesson>) -> Result<(), Rejection> {
    match existing {
        Some(lesson) if class.has_lesson(lesson.id) => Err(lesson_already_offered()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use classbook_models::LessonId;

    #[test]
    fn test_national_id_parsing() {
        assert_eq!(
            national_id(None).unwrap_err(),
            Rejection::validation("The national id is required.")
        );
        assert_eq!(
            national_id(Some("   ")).unwrap_err(),
            Rejection::validation("The national id is required.")
        );
        assert_eq!(
            national_id(Some("12345")).unwrap_err(),
            Rejection::validation("National id must be 10 digits")
        );
        assert_eq!(national_id(Some(" 0012345678 ")).unwrap().as_str(), "0012345678");
    }

    #[test]
    fn test_student_lookup_requires_student_role() {
        let world = World::new();
        let id = world.teacher.national_id.clone();
        let err = student(Some(world.teacher.clone()), &id).unwrap_err();
        assert_eq!(
            err,
            Rejection::not_found(format!(
                "The student with this national_id = {} does not exist or is not a student.",
                id
            ))
        );
        assert!(student(None, &id).is_err());
        assert!(student(Some(world.student.clone()), &world.student.national_id).is_ok());
    }

    #[test]
    fn test_add_and_remove_student() {
        let world = World::new();
        let newcomer = user(Role::Student);

        assert!(add_student(&world.class, &newcomer).is_ok());
        assert_eq!(
            add_student(&world.class, &world.student).unwrap_err(),
            Rejection::conflict("The student was already in this class.")
        );
        assert_eq!(
            remove_student(&world.class, &newcomer).unwrap_err(),
            Rejection::conflict("The student was not in this class.")
        );
        assert!(remove_student(&world.class, &world.student).is_ok());
    }

    #[test]
    fn test_lesson_name_rules() {
        assert!(lesson_name(None).is_err());
        assert!(lesson_name(Some("")).is_err());
        assert!(lesson_name(Some(&"x".repeat(256))).is_err());
        assert_eq!(lesson_name(Some("  Physics ")).unwrap(), "Physics");
    }

    #[test]
    fn test_add_lesson_conflicts_on_offered_lesson() {
        let world = World::new();
        assert!(add_lesson(&world.class, None).is_ok());
        assert!(matches!(
            add_lesson(&world.class, Some(&world.lesson)),
            Err(Rejection::Conflict(_))
        ));

        let other = Lesson {
            id: LessonId::new(),
            name: "Physics".into(),
        };
        assert!(add_lesson(&world.class, Some(&other)).is_ok());
    }
}
