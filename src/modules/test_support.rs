//! A small seeded campus for service tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};

use classbook_authz::{Chain, Committed, FixedClock, MemoryStore, Mutation, Plan, ResourceRef, Store};
use classbook_models::{
    Assignment, AssignmentId, Class, ClassId, Lesson, NationalId, Role, School, SchoolId,
    Solution, SolutionId, User, UserId,
};

use crate::middleware::session::Session;

static NATIONAL_IDS: AtomicU64 = AtomicU64::new(1);

pub fn created_at() -> DateTime<Utc> {
    DateTime::from_timestamp(1_750_000_000, 0).unwrap()
}

pub fn deadline() -> DateTime<Utc> {
    created_at() + Duration::days(7)
}

pub fn before_deadline() -> DateTime<Utc> {
    deadline() - Duration::hours(1)
}

pub fn after_deadline() -> DateTime<Utc> {
    deadline() + Duration::hours(1)
}

pub async fn add_user(store: &MemoryStore, username: &str, role: Role) -> User {
    let serial = NATIONAL_IDS.fetch_add(1, Ordering::Relaxed);
    let user = User {
        id: UserId::new(),
        username: username.to_string(),
        first_name: username.to_string(),
        last_name: "Test".to_string(),
        email: format!("{}-{}@example.com", username, serial),
        national_id: NationalId::new(format!("{:010}", serial)).unwrap(),
        role,
        bio: None,
        is_active: true,
        created_at: created_at(),
    };
    store.insert_user(user).await.unwrap()
}

async fn staff(store: &MemoryStore, mutation: Mutation) -> Committed {
    store
        .commit(Plan::staff(mutation, created_at()))
        .await
        .unwrap()
}

/// One school with one class taught by `teacher`, attended by `student` and
/// `classmate`, offering one lesson, with one assignment and one solution
/// by `student`. `outsider` is a student in no class.
pub struct Campus {
    pub store: MemoryStore,
    pub clock: Arc<FixedClock>,
    pub manager: User,
    pub teacher: User,
    pub other_teacher: User,
    pub student: User,
    pub classmate: User,
    pub outsider: User,
    pub school: School,
    pub class: Class,
    pub lesson: Lesson,
    pub assignment: Assignment,
    pub solution: Solution,
}

impl Campus {
    pub async fn new() -> Self {
        let clock = Arc::new(FixedClock::new(created_at()));
        let store = MemoryStore::with_clock(clock.clone());
        let manager = add_user(&store, "manager", Role::Manager).await;
        let teacher = add_user(&store, "teacher", Role::Teacher).await;
        let other_teacher = add_user(&store, "other_teacher", Role::Teacher).await;
        let student = add_user(&store, "student", Role::Student).await;
        let classmate = add_user(&store, "classmate", Role::Student).await;
        let outsider = add_user(&store, "outsider", Role::Student).await;

        let school = store
            .insert_school(School {
                id: SchoolId::new(),
                name: "Hilltop".into(),
                manager_id: Some(manager.id),
                created_at: created_at(),
            })
            .await
            .unwrap();

        let class_id = ClassId::new();
        staff(
            &store,
            Mutation::CreateClass(Class {
                id: class_id,
                name: "7B".into(),
                school_id: school.id,
                teacher_id: Some(teacher.id),
                student_ids: Vec::new(),
                lesson_ids: Vec::new(),
                created_at: created_at(),
            }),
        )
        .await;
        for member in [&student, &classmate] {
            staff(
                &store,
                Mutation::AddStudent {
                    class_id,
                    student_id: member.id,
                },
            )
            .await;
        }
        let lesson = staff(
            &store,
            Mutation::AddLesson {
                class_id,
                name: "Mathematics".into(),
            },
        )
        .await
        .into_lesson()
        .unwrap();

        let assignment = Assignment {
            id: AssignmentId::new(),
            title: "Fractions".into(),
            context: Some("Exercises 1-10".into()),
            attachment: None,
            grade_max: 100.0,
            deadline: deadline(),
            answer_text: None,
            answer_file: None,
            lesson_id: lesson.id,
            class_id,
            created_at: created_at(),
            last_modified: created_at(),
        };
        staff(&store, Mutation::CreateAssignment(assignment.clone())).await;

        let solution = Solution {
            id: SolutionId::new(),
            context: Some("1/2".into()),
            attachment: None,
            grade: None,
            graded_at: None,
            student_id: student.id,
            assignment_id: assignment.id,
            created_at: created_at(),
            last_modified: created_at(),
        };
        staff(&store, Mutation::SubmitSolution(solution.clone())).await;

        let class = match store
            .load(ResourceRef::Class(class_id))
            .await
            .unwrap()
        {
            Some(Chain::Class(class)) => class,
            other => panic!("class not seeded: {:?}", other),
        };

        Self {
            store,
            clock,
            manager,
            teacher,
            other_teacher,
            student,
            classmate,
            outsider,
            school,
            class,
            lesson,
            assignment,
            solution,
        }
    }

    /// A session at `now`; the store's clock moves there too, so the
    /// commit sees the same instant.
    pub async fn session(&self, user: &User, now: DateTime<Utc>) -> Session {
        self.clock.set(now);
        let actor = self.store.actor(user.id).await.unwrap().unwrap();
        Session::new(actor, now)
    }

    pub async fn deactivate(&self, user: &User) {
        self.store.set_user_active(user.id, false).await.unwrap();
    }
}
