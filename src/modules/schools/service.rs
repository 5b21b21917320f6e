use std::collections::BTreeSet;

use tracing::instrument;

use classbook_authz::{Action, Chain, ResourceRef, Scan, Store};
use classbook_core::AppError;
use classbook_models::{Class, Lesson, School, SchoolId, User};

use crate::middleware::session::Session;

pub struct SchoolService;

impl SchoolService {
    async fn classes(
        store: &dyn Store,
        session: &Session,
        school_id: SchoolId,
        action: Action,
    ) -> Result<Vec<Class>, AppError> {
        session.school(store, school_id, action).await?;

        let chains = store.scan(Scan::ClassesInSchools(vec![school_id])).await?;
        Ok(chains
            .into_iter()
            .filter_map(|chain| match chain {
                Chain::Class(class) => Some(class),
                _ => None,
            })
            .collect())
    }

    /// The schools the actor may see: a manager sees the one they run.
    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn list_schools(
        store: &dyn Store,
        session: &Session,
    ) -> Result<Vec<School>, AppError> {
        let targets = session.actor.school_ids().into_iter().map(ResourceRef::School);
        let chains = session.load_all(store, targets).await?;

        Ok(session
            .visible(chains)
            .into_iter()
            .filter_map(|chain| match chain {
                Chain::School(school) => Some(school),
                _ => None,
            })
            .collect())
    }

    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn get_school(
        store: &dyn Store,
        session: &Session,
        school_id: SchoolId,
    ) -> Result<School, AppError> {
        session.school(store, school_id, Action::View).await
    }

    /// Students enrolled in any class of the school.
    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn list_students(
        store: &dyn Store,
        session: &Session,
        school_id: SchoolId,
    ) -> Result<Vec<User>, AppError> {
        let classes = Self::classes(store, session, school_id, Action::ListStudents).await?;
        let ids: BTreeSet<_> = classes
            .iter()
            .flat_map(|class| class.student_ids.iter().copied())
            .collect();
        store.users(&ids.into_iter().collect::<Vec<_>>()).await
    }

    /// Teachers assigned to a class of the school.
    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn list_teachers(
        store: &dyn Store,
        session: &Session,
        school_id: SchoolId,
    ) -> Result<Vec<User>, AppError> {
        let classes = Self::classes(store, session, school_id, Action::ListTeachers).await?;
        let ids: BTreeSet<_> = classes.iter().filter_map(|class| class.teacher_id).collect();
        store.users(&ids.into_iter().collect::<Vec<_>>()).await
    }

    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn list_lessons(
        store: &dyn Store,
        session: &Session,
        school_id: SchoolId,
    ) -> Result<Vec<Lesson>, AppError> {
        let classes = Self::classes(store, session, school_id, Action::ListLessons).await?;
        let ids: BTreeSet<_> = classes
            .iter()
            .flat_map(|class| class.lesson_ids.iter().copied())
            .collect();
        store.lessons(&ids.into_iter().collect::<Vec<_>>()).await
    }
}
