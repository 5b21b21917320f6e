use tracing::{info, instrument};

use classbook_authz::{Action, Chain, Mutation, Precondition, Scan, Store, membership};
use classbook_core::{AppError, Rejection};
use classbook_models::{
    AddLessonDto, Class, ClassId, CreateClassDto, Lesson, MessageResponse, Role,
    StudentMembershipDto, UpdateClassDto, User, UserId,
};

use crate::middleware::session::Session;

pub struct ClassService;

impl ClassService {
    /// A newly named teacher must exist and hold the teacher role.
    async fn ensure_teacher(store: &dyn Store, teacher_id: Option<UserId>) -> Result<(), AppError> {
        let Some(teacher_id) = teacher_id else {
            return Ok(());
        };
        let role = store.user(teacher_id).await?.map(|user| user.role);
        if role != Some(Role::Teacher) {
            return Err(Rejection::validation(
                "The class teacher must be a user with the teacher role.",
            )
            .into());
        }
        Ok(())
    }

    /// Classes the actor teaches, attends or manages.
    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn list_classes(store: &dyn Store, session: &Session) -> Result<Vec<Class>, AppError> {
        let chains = store
            .scan(Scan::ClassesInSchools(session.actor.school_ids()))
            .await?;

        Ok(session
            .visible(chains)
            .into_iter()
            .filter_map(|chain| match chain {
                Chain::Class(class) => Some(class),
                _ => None,
            })
            .collect())
    }

    #[instrument(skip(store, session, dto), fields(actor = %session.user_id(), school_id = %dto.school_id))]
    pub async fn create_class(
        store: &dyn Store,
        session: &Session,
        dto: CreateClassDto,
    ) -> Result<Class, AppError> {
        let school = session
            .school(store, dto.school_id, Action::CreateClass)
            .await?;
        Self::ensure_teacher(store, dto.teacher_id).await?;

        let class = Class {
            id: ClassId::new(),
            name: dto.name,
            school_id: school.id,
            teacher_id: dto.teacher_id,
            student_ids: Vec::new(),
            lesson_ids: Vec::new(),
            created_at: session.now,
        };

        let plan = session
            .plan(Mutation::CreateClass(class))
            .require(Precondition::SchoolManager {
                school_id: school.id,
                user_id: session.user_id(),
            });
        let class = store.commit(plan).await?.into_class()?;

        info!(class_id = %class.id, "Class created");
        Ok(class)
    }

    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn get_class(
        store: &dyn Store,
        session: &Session,
        class_id: ClassId,
    ) -> Result<Class, AppError> {
        session.class(store, class_id, Action::View).await
    }

    #[instrument(skip(store, session, dto), fields(actor = %session.user_id()))]
    pub async fn update_class(
        store: &dyn Store,
        session: &Session,
        class_id: ClassId,
        dto: UpdateClassDto,
    ) -> Result<Class, AppError> {
        let class = session.class(store, class_id, Action::Update).await?;
        Self::ensure_teacher(store, dto.teacher_id).await?;

        let plan = session
            .plan(Mutation::UpdateClass {
                class_id,
                name: dto.name,
                teacher_id: dto.teacher_id,
            })
            .require(Precondition::SchoolManager {
                school_id: class.school_id,
                user_id: session.user_id(),
            });
        store.commit(plan).await?.into_class()
    }

    /// Deletes the class with its assignments, their solutions and its news.
    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn delete_class(
        store: &dyn Store,
        session: &Session,
        class_id: ClassId,
    ) -> Result<(), AppError> {
        let class = session.class(store, class_id, Action::Delete).await?;

        let plan = session
            .plan(Mutation::DeleteClass { class_id })
            .require(Precondition::SchoolManager {
                school_id: class.school_id,
                user_id: session.user_id(),
            });
        store.commit(plan).await?;

        info!(%class_id, "Class deleted");
        Ok(())
    }

    async fn membership_target(
        store: &dyn Store,
        session: &Session,
        class_id: ClassId,
        action: Action,
        dto: StudentMembershipDto,
    ) -> Result<(Class, User), AppError> {
        let class = session.class(store, class_id, action).await?;
        let national_id = membership::national_id(dto.national_id.as_deref())?;
        let found = store.student_by_national_id(&national_id).await?;
        let student = membership::student(found, &national_id)?;
        Ok((class, student))
    }

    #[instrument(skip(store, session, dto), fields(actor = %session.user_id()))]
    pub async fn add_student(
        store: &dyn Store,
        session: &Session,
        class_id: ClassId,
        dto: StudentMembershipDto,
    ) -> Result<MessageResponse, AppError> {
        let (class, student) =
            Self::membership_target(store, session, class_id, Action::AddStudent, dto).await?;
        membership::add_student(&class, &student)?;

        let plan = session
            .plan(Mutation::AddStudent {
                class_id,
                student_id: student.id,
            })
            .require(Precondition::ClassTeacher {
                class_id,
                user_id: session.user_id(),
            })
            .require(Precondition::StudentMembership {
                class_id,
                student_id: student.id,
                expect_member: false,
            });
        store.commit(plan).await?;

        info!(student_id = %student.id, "Student added to class");
        Ok(MessageResponse::new("The student was added to this class."))
    }

    #[instrument(skip(store, session, dto), fields(actor = %session.user_id()))]
    pub async fn remove_student(
        store: &dyn Store,
        session: &Session,
        class_id: ClassId,
        dto: StudentMembershipDto,
    ) -> Result<MessageResponse, AppError> {
        let (class, student) =
            Self::membership_target(store, session, class_id, Action::RemoveStudent, dto).await?;
        membership::remove_student(&class, &student)?;

        let plan = session
            .plan(Mutation::RemoveStudent {
                class_id,
                student_id: student.id,
            })
            .require(Precondition::ClassTeacher {
                class_id,
                user_id: session.user_id(),
            })
            .require(Precondition::StudentMembership {
                class_id,
                student_id: student.id,
                expect_member: true,
            });
        store.commit(plan).await?;

        info!(student_id = %student.id, "Student removed from class");
        Ok(MessageResponse::new("The student was removed from this class."))
    }

    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn list_students(
        store: &dyn Store,
        session: &Session,
        class_id: ClassId,
    ) -> Result<Vec<User>, AppError> {
        let class = session.class(store, class_id, Action::ListStudents).await?;
        store.users(&class.student_ids).await
    }

    /// Offers a lesson by name, creating the catalog entry on first use.
    #[instrument(skip(store, session, dto), fields(actor = %session.user_id()))]
    pub async fn add_lesson(
        store: &dyn Store,
        session: &Session,
        class_id: ClassId,
        dto: AddLessonDto,
    ) -> Result<Lesson, AppError> {
        let class = session.class(store, class_id, Action::AddLesson).await?;
        let name = membership::lesson_name(dto.name.as_deref())?;
        let existing = store.lesson_by_name(&name).await?;
        membership::add_lesson(&class, existing.as_ref())?;

        let plan = session
            .plan(Mutation::AddLesson {
                class_id,
                name: name.clone(),
            })
            .require(Precondition::SchoolManager {
                school_id: class.school_id,
                user_id: session.user_id(),
            })
            .require(Precondition::LessonNameFree { class_id, name });
        let lesson = store.commit(plan).await?.into_lesson()?;

        info!(lesson_id = %lesson.id, "Lesson added to class");
        Ok(lesson)
    }

    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn list_lessons(
        store: &dyn Store,
        session: &Session,
        class_id: ClassId,
    ) -> Result<Vec<Lesson>, AppError> {
        let class = session.class(store, class_id, Action::ListLessons).await?;
        store.lessons(&class.lesson_ids).await
    }
}
