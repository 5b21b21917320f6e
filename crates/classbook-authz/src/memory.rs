//! In-process [`Store`] backed by hash maps behind a tokio `RwLock`.
//!
//! Commits take the write lock, so precondition checks and the mutation
//! they guard see the same state. The store reads its clock under that lock
//! for deadline preconditions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use classbook_core::{AppError, Rejection};
use classbook_models::{
    Assignment, AssignmentId, Class, ClassId, Lesson, LessonId, NationalId, News, NewsId, Role,
    School, SchoolId, Solution, SolutionId, User, UserId,
};

use crate::clock::{Clock, SystemClock};
use crate::commit::{Committed, Fact, Mutation, Plan, Precondition};
use crate::identity::{ActorContext, ClassMembership};
use crate::relationship::{Chain, ResourceKind, ResourceRef};
use crate::store::{Scan, Store};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    schools: HashMap<SchoolId, School>,
    classes: HashMap<ClassId, Class>,
    lessons: HashMap<LessonId, Lesson>,
    assignments: HashMap<AssignmentId, Assignment>,
    solutions: HashMap<SolutionId, Solution>,
    news: HashMap<NewsId, News>,
}

pub struct MemoryStore {
    state: RwLock<State>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// A store whose commits read `clock`; share it with the app state so
    /// requests and commits agree on time.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::default(),
            clock,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

fn not_found(kind: ResourceKind) -> Rejection {
    Rejection::not_found(format!("{} not found.", kind))
}

impl State {
    fn class_chain(&self, id: ClassId) -> Option<Chain> {
        self.classes.get(&id).cloned().map(Chain::Class)
    }

    fn assignment_chain(&self, id: AssignmentId) -> Option<Chain> {
        let assignment = self.assignments.get(&id)?;
        let class = self.classes.get(&assignment.class_id)?;
        Some(Chain::Assignment {
            assignment: assignment.clone(),
            class: class.clone(),
        })
    }

    fn solution_chain(&self, id: SolutionId) -> Option<Chain> {
        let solution = self.solutions.get(&id)?;
        let assignment = self.assignments.get(&solution.assignment_id)?;
        let class = self.classes.get(&assignment.class_id)?;
        Some(Chain::Solution {
            solution: solution.clone(),
            assignment: assignment.clone(),
            class: class.clone(),
        })
    }

    fn news_chain(&self, id: NewsId) -> Option<Chain> {
        let news = self.news.get(&id)?;
        match (news.class_id, news.school_id) {
            (Some(class_id), _) => {
                let class = self.classes.get(&class_id)?;
                Some(Chain::News {
                    news: news.clone(),
                    school_id: class.school_id,
                    class: Some(class.clone()),
                })
            }
            (None, Some(school_id)) => Some(Chain::News {
                news: news.clone(),
                class: None,
                school_id,
            }),
            (None, None) => None,
        }
    }

    fn chain(&self, target: ResourceRef) -> Option<Chain> {
        match target {
            ResourceRef::School(id) => self.schools.get(&id).cloned().map(Chain::School),
            ResourceRef::Class(id) => self.class_chain(id),
            ResourceRef::Assignment(id) => self.assignment_chain(id),
            ResourceRef::Solution(id) => self.solution_chain(id),
            ResourceRef::News(id) => self.news_chain(id),
        }
    }

    fn class_fact(&self, id: &ClassId, test: impl FnOnce(&Class) -> bool) -> Fact {
        match self.classes.get(id) {
            Some(class) => Fact::Holds(test(class)),
            None => Fact::Missing(ResourceKind::Class),
        }
    }

    fn fact(&self, precondition: &Precondition) -> Fact {
        match precondition {
            Precondition::ActorActive(user_id) => {
                Fact::Holds(self.users.get(user_id).is_some_and(|u| u.is_active))
            }
            Precondition::ClassTeacher { class_id, user_id } => {
                self.class_fact(class_id, |class| class.is_taught_by(*user_id))
            }
            Precondition::ClassStudent { class_id, user_id } => {
                self.class_fact(class_id, |class| class.has_student(*user_id))
            }
            Precondition::StudentMembership {
                class_id,
                student_id,
                ..
            } => self.class_fact(class_id, |class| class.has_student(*student_id)),
            Precondition::LessonOffered {
                class_id,
                lesson_id,
            } => self.class_fact(class_id, |class| class.has_lesson(*lesson_id)),
            Precondition::LessonNameFree { class_id, name } => self.class_fact(class_id, |class| {
                class
                    .lesson_ids
                    .iter()
                    .filter_map(|id| self.lessons.get(id))
                    .any(|lesson| lesson.name == *name)
            }),
            Precondition::SchoolManager { school_id, user_id } => self
                .schools
                .get(school_id)
                .map_or(Fact::Missing(ResourceKind::School), |school| {
                    Fact::Holds(school.manager_id == Some(*user_id))
                }),
            Precondition::Deadline { assignment_id, .. } => self
                .assignments
                .get(assignment_id)
                .map_or(Fact::Missing(ResourceKind::Assignment), |a| {
                    Fact::Deadline(a.deadline)
                }),
            Precondition::SolutionAuthor {
                solution_id,
                student_id,
            } => self
                .solutions
                .get(solution_id)
                .map_or(Fact::Missing(ResourceKind::Solution), |s| {
                    Fact::Holds(s.student_id == *student_id)
                }),
            Precondition::SingleSubmission {
                assignment_id,
                student_id,
            } => Fact::Count(
                self.solutions
                    .values()
                    .filter(|s| s.assignment_id == *assignment_id && s.student_id == *student_id)
                    .count(),
            ),
            Precondition::Exists(target) => match self.chain(*target) {
                Some(_) => Fact::Holds(true),
                None => Fact::Missing(target.kind()),
            },
        }
    }

    fn apply(&mut self, plan: Plan) -> Result<Committed, Rejection> {
        let now = plan.now;

        let committed = match plan.mutation {
            Mutation::CreateClass(class) => {
                if !self.schools.contains_key(&class.school_id) {
                    return Err(not_found(ResourceKind::School));
                }
                self.classes.insert(class.id, class.clone());
                Committed::Class(class)
            }
            Mutation::UpdateClass {
                class_id,
                name,
                teacher_id,
            } => {
                let class = self.class_mut(class_id)?;
                if let Some(name) = name {
                    class.name = name;
                }
                if teacher_id.is_some() {
                    class.teacher_id = teacher_id;
                }
                Committed::Class(class.clone())
            }
            Mutation::DeleteClass { class_id } => {
                self.classes
                    .remove(&class_id)
                    .ok_or_else(|| not_found(ResourceKind::Class))?;
                let assignments: Vec<AssignmentId> = self
                    .assignments
                    .values()
                    .filter(|a| a.class_id == class_id)
                    .map(|a| a.id)
                    .collect();
                self.solutions
                    .retain(|_, s| !assignments.contains(&s.assignment_id));
                self.assignments.retain(|_, a| a.class_id != class_id);
                self.news.retain(|_, n| n.class_id != Some(class_id));
                Committed::Deleted
            }
            Mutation::AddStudent {
                class_id,
                student_id,
            } => {
                let class = self.class_mut(class_id)?;
                if !class.has_student(student_id) {
                    class.student_ids.push(student_id);
                }
                Committed::Class(class.clone())
            }
            Mutation::RemoveStudent {
                class_id,
                student_id,
            } => {
                let class = self.class_mut(class_id)?;
                class.student_ids.retain(|id| *id != student_id);
                Committed::Class(class.clone())
            }
            Mutation::AddLesson { class_id, name } => {
                let lesson = match self.lessons.values().find(|l| l.name == name) {
                    Some(lesson) => lesson.clone(),
                    None => {
                        let lesson = Lesson {
                            id: LessonId::new(),
                            name,
                        };
                        self.lessons.insert(lesson.id, lesson.clone());
                        lesson
                    }
                };
                let class = self.class_mut(class_id)?;
                if !class.has_lesson(lesson.id) {
                    class.lesson_ids.push(lesson.id);
                }
                Committed::Lesson(lesson)
            }
            Mutation::CreateAssignment(assignment) => {
                self.assignments.insert(assignment.id, assignment.clone());
                Committed::Assignment(assignment)
            }
            Mutation::UpdateAssignment {
                assignment_id,
                changes,
            } => {
                let assignment = self
                    .assignments
                    .get_mut(&assignment_id)
                    .ok_or_else(|| not_found(ResourceKind::Assignment))?;
                if let Some(title) = changes.title {
                    assignment.title = title;
                }
                if let Some(context) = changes.context {
                    assignment.context = Some(context);
                }
                if let Some(attachment) = changes.attachment {
                    assignment.attachment = Some(attachment);
                }
                if let Some(deadline) = changes.deadline {
                    assignment.deadline = deadline;
                }
                assignment.last_modified = now;
                Committed::Assignment(assignment.clone())
            }
            Mutation::AddAnswer {
                assignment_id,
                answer,
            } => {
                let assignment = self
                    .assignments
                    .get_mut(&assignment_id)
                    .ok_or_else(|| not_found(ResourceKind::Assignment))?;
                if answer.text.is_some() {
                    assignment.answer_text = answer.text;
                }
                if answer.file.is_some() {
                    assignment.answer_file = answer.file;
                }
                assignment.last_modified = now;
                Committed::Assignment(assignment.clone())
            }
            Mutation::SubmitSolution(solution) => {
                self.solutions.insert(solution.id, solution.clone());
                Committed::Solution(solution)
            }
            Mutation::UpdateSolution { solution_id, body } => {
                let solution = self.solution_mut(solution_id)?;
                solution.context = body.context;
                solution.attachment = body.attachment;
                solution.last_modified = now;
                Committed::Solution(solution.clone())
            }
            Mutation::GradeSolution { solution_id, grade } => {
                let solution = self.solution_mut(solution_id)?;
                solution.grade = Some(grade);
                solution.graded_at = Some(now);
                solution.last_modified = now;
                Committed::Solution(solution.clone())
            }
            Mutation::CreateNews(news) => {
                self.news.insert(news.id, news.clone());
                Committed::News(news)
            }
            Mutation::UpdateNews {
                news_id,
                title,
                context,
            } => {
                let news = self
                    .news
                    .get_mut(&news_id)
                    .ok_or_else(|| not_found(ResourceKind::News))?;
                if let Some(title) = title {
                    news.title = title;
                }
                if let Some(context) = context {
                    news.context = context;
                }
                news.last_modified = now;
                Committed::News(news.clone())
            }
            Mutation::DeleteNews { news_id } => {
                self.news
                    .remove(&news_id)
                    .ok_or_else(|| not_found(ResourceKind::News))?;
                Committed::Deleted
            }
            Mutation::UpdateProfile { user_id, bio } => {
                let user = self
                    .users
                    .get_mut(&user_id)
                    .ok_or_else(|| Rejection::not_found("User not found."))?;
                user.bio = bio;
                Committed::User(user.clone())
            }
        };

        Ok(committed)
    }

    fn class_mut(&mut self, id: ClassId) -> Result<&mut Class, Rejection> {
        self.classes
            .get_mut(&id)
            .ok_or_else(|| not_found(ResourceKind::Class))
    }

    fn solution_mut(&mut self, id: SolutionId) -> Result<&mut Solution, Rejection> {
        self.solutions
            .get_mut(&id)
            .ok_or_else(|| not_found(ResourceKind::Solution))
    }
}

fn sort_chains(chains: &mut [Chain]) {
    chains.sort_by_key(|chain| match chain {
        Chain::School(school) => (school.created_at, school.id.into_inner()),
        Chain::Class(class) => (class.created_at, class.id.into_inner()),
        Chain::Assignment { assignment, .. } => (assignment.created_at, assignment.id.into_inner()),
        Chain::Solution { solution, .. } => (solution.created_at, solution.id.into_inner()),
        Chain::News { news, .. } => (news.created_at, news.id.into_inner()),
    });
}

#[async_trait]
impl Store for MemoryStore {
    async fn actor(&self, user_id: UserId) -> Result<Option<ActorContext>, AppError> {
        let state = self.state.read().await;
        let Some(user) = state.users.get(&user_id).cloned() else {
            return Ok(None);
        };

        let membership = |class: &Class| ClassMembership {
            class_id: class.id,
            school_id: class.school_id,
        };

        Ok(Some(ActorContext {
            managed_school: state
                .schools
                .values()
                .find(|s| s.manager_id == Some(user_id))
                .map(|s| s.id),
            taught_classes: state
                .classes
                .values()
                .filter(|c| c.is_taught_by(user_id))
                .map(membership)
                .collect(),
            attended_classes: state
                .classes
                .values()
                .filter(|c| c.has_student(user_id))
                .map(membership)
                .collect(),
            user,
        }))
    }

    async fn load(&self, target: ResourceRef) -> Result<Option<Chain>, AppError> {
        Ok(self.state.read().await.chain(target))
    }

    async fn scan(&self, scan: Scan) -> Result<Vec<Chain>, AppError> {
        let state = self.state.read().await;

        let mut chains: Vec<Chain> = match scan {
            Scan::ClassesInSchools(schools) => state
                .classes
                .values()
                .filter(|c| schools.contains(&c.school_id))
                .map(|c| Chain::Class(c.clone()))
                .collect(),
            Scan::AssignmentsInClasses(classes) => state
                .assignments
                .values()
                .filter(|a| classes.contains(&a.class_id))
                .filter_map(|a| state.assignment_chain(a.id))
                .collect(),
            Scan::SolutionsInClasses(classes) => state
                .solutions
                .values()
                .filter_map(|s| state.solution_chain(s.id))
                .filter(|chain| chain.class().is_some_and(|c| classes.contains(&c.id)))
                .collect(),
            Scan::SolutionsOfAssignment(assignment_id) => state
                .solutions
                .values()
                .filter(|s| s.assignment_id == assignment_id)
                .filter_map(|s| state.solution_chain(s.id))
                .collect(),
            Scan::NewsInSchools(schools) => state
                .news
                .keys()
                .filter_map(|id| state.news_chain(*id))
                .filter(|chain| schools.contains(&chain.school_id()))
                .collect(),
        };

        sort_chains(&mut chains);
        Ok(chains)
    }

    async fn users(&self, ids: &[UserId]) -> Result<Vec<User>, AppError> {
        let state = self.state.read().await;
        let mut users: Vec<User> = ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users.dedup_by_key(|u| u.id);
        Ok(users)
    }

    async fn student_by_national_id(
        &self,
        national_id: &NationalId,
    ) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.role == Role::Student && u.national_id == *national_id)
            .cloned())
    }

    async fn lessons(&self, ids: &[LessonId]) -> Result<Vec<Lesson>, AppError> {
        let state = self.state.read().await;
        let mut lessons: Vec<Lesson> = ids
            .iter()
            .filter_map(|id| state.lessons.get(id).cloned())
            .collect();
        lessons.sort_by(|a, b| a.name.cmp(&b.name));
        lessons.dedup_by_key(|l| l.id);
        Ok(lessons)
    }

    async fn lesson_by_name(&self, name: &str) -> Result<Option<Lesson>, AppError> {
        let state = self.state.read().await;
        Ok(state.lessons.values().find(|l| l.name == name).cloned())
    }

    async fn commit(&self, plan: Plan) -> Result<Committed, AppError> {
        let mut state = self.state.write().await;
        let mutation = plan.mutation.name();
        let at = self.clock.now();

        if let Err(rejection) = plan.verify(at, |precondition| state.fact(precondition)) {
            debug!(mutation, %rejection, "Commit refused");
            return Err(rejection.into());
        }

        let committed = state.apply(plan)?;
        info!(mutation, "Committed");
        Ok(committed)
    }

    async fn insert_user(&self, user: User) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        let duplicate = state.users.values().any(|u| {
            u.username == user.username || u.email == user.email || u.national_id == user.national_id
        });
        if duplicate {
            return Err(Rejection::conflict(
                "A user with this username, email or national id already exists.",
            )
            .into());
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn insert_school(&self, school: School) -> Result<School, AppError> {
        let mut state = self.state.write().await;
        if let Some(manager_id) = school.manager_id {
            let is_manager = state
                .users
                .get(&manager_id)
                .is_some_and(|u| u.role == Role::Manager);
            if !is_manager {
                return Err(Rejection::validation(
                    "The school manager must be a user with the manager role.",
                )
                .into());
            }
            if state.schools.values().any(|s| s.manager_id == Some(manager_id)) {
                return Err(Rejection::conflict("This manager already runs a school.").into());
            }
        }
        state.schools.insert(school.id, school.clone());
        Ok(school)
    }

    async fn set_user_active(&self, user_id: UserId, active: bool) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| Rejection::not_found("User not found."))?;
        user.is_active = active;
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::fixtures::*;
    use crate::workflow::DeadlineWindow;
    use chrono::Duration;

    async fn seeded() -> (MemoryStore, World, Arc<FixedClock>) {
        let world = World::new();
        let clock = Arc::new(FixedClock::new(before_deadline()));
        let store = MemoryStore::with_clock(clock.clone());
        for user in [&world.manager, &world.teacher, &world.student, &world.classmate] {
            store.insert_user(user.clone()).await.unwrap();
        }
        store.insert_school(world.school.clone()).await.unwrap();
        {
            let mut state = store.state.write().await;
            state.lessons.insert(world.lesson.id, world.lesson.clone());
            state.classes.insert(world.class.id, world.class.clone());
            state
                .assignments
                .insert(world.assignment.id, world.assignment.clone());
            state.solutions.insert(world.solution.id, world.solution.clone());
            state.news.insert(world.class_news.id, world.class_news.clone());
            state.news.insert(world.school_news.id, world.school_news.clone());
        }
        (store, world, clock)
    }

    fn add_student_plan(world: &World, student_id: UserId) -> Plan {
        Plan::new(
            world.teacher.id,
            Mutation::AddStudent {
                class_id: world.class.id,
                student_id,
            },
            before_deadline(),
        )
        .require(Precondition::StudentMembership {
            class_id: world.class.id,
            student_id,
            expect_member: false,
        })
    }

    fn remove_student_plan(world: &World, student_id: UserId) -> Plan {
        Plan::new(
            world.teacher.id,
            Mutation::RemoveStudent {
                class_id: world.class.id,
                student_id,
            },
            before_deadline(),
        )
        .require(Precondition::StudentMembership {
            class_id: world.class.id,
            student_id,
            expect_member: true,
        })
    }

    #[tokio::test]
    async fn test_actor_context_reflects_memberships() {
        let (store, world, _) = seeded().await;

        let teacher = store.actor(world.teacher.id).await.unwrap().unwrap();
        assert!(teacher.teaches(world.class.id));
        assert!(teacher.attended_classes.is_empty());

        let manager = store.actor(world.manager.id).await.unwrap().unwrap();
        assert_eq!(manager.managed_school, Some(world.school.id));

        assert!(store.actor(UserId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_builds_full_chain() {
        let (store, world, _) = seeded().await;
        let chain = store
            .load(ResourceRef::Solution(world.solution.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(chain, world.solution_chain());
        assert!(store
            .load(ResourceRef::Assignment(AssignmentId::new()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_add_student_twice_conflicts() {
        let (store, world, _) = seeded().await;
        let newcomer = user(Role::Student);
        store.insert_user(newcomer.clone()).await.unwrap();

        store.commit(add_student_plan(&world, newcomer.id)).await.unwrap();
        let err = store
            .commit(add_student_plan(&world, newcomer.id))
            .await
            .unwrap_err();
        assert_eq!(
            err.rejection(),
            Some(&Rejection::conflict("The student was already in this class."))
        );
    }

    #[tokio::test]
    async fn test_remove_then_add_restores_membership() {
        let (store, world, _) = seeded().await;

        let class = store
            .commit(remove_student_plan(&world, world.student.id))
            .await
            .unwrap()
            .into_class()
            .unwrap();
        assert!(!class.has_student(world.student.id));

        let err = store
            .commit(remove_student_plan(&world, world.student.id))
            .await
            .unwrap_err();
        assert!(matches!(err.rejection(), Some(Rejection::Conflict(_))));

        let class = store
            .commit(add_student_plan(&world, world.student.id))
            .await
            .unwrap()
            .into_class()
            .unwrap();
        assert!(class.has_student(world.student.id));
    }

    #[tokio::test]
    async fn test_commit_rechecks_deadline_against_fresh_state() {
        let (store, world, _) = seeded().await;

        // the teacher pulls the deadline forward after the student was admitted
        store
            .state
            .write()
            .await
            .assignments
            .get_mut(&world.assignment.id)
            .unwrap()
            .deadline = before_deadline() - Duration::seconds(10);

        let solution = Solution {
            id: SolutionId::new(),
            student_id: world.classmate.id,
            ..world.solution.clone()
        };
        let plan = Plan::new(
            world.classmate.id,
            Mutation::SubmitSolution(solution),
            before_deadline(),
        )
        .require(Precondition::Deadline {
            assignment_id: world.assignment.id,
            window: DeadlineWindow::Before,
        });

        let err = store.commit(plan).await.unwrap_err();
        assert!(matches!(err.rejection(), Some(Rejection::InvalidTransition(_))));
        assert_eq!(store.state.read().await.solutions.len(), 1);
    }

    #[tokio::test]
    async fn test_deadline_passing_mid_request_refuses_commit() {
        let (store, world, clock) = seeded().await;
        let solution = Solution {
            id: SolutionId::new(),
            student_id: world.classmate.id,
            ..world.solution.clone()
        };
        let plan = Plan::new(
            world.classmate.id,
            Mutation::SubmitSolution(solution),
            before_deadline(),
        )
        .require(Precondition::Deadline {
            assignment_id: world.assignment.id,
            window: DeadlineWindow::Before,
        });

        // admitted a moment before the deadline, lands after it
        clock.set(deadline() + Duration::seconds(2));

        let err = store.commit(plan.clone()).await.unwrap_err();
        assert_eq!(
            err.rejection(),
            Some(&Rejection::invalid_transition("The assignment deadline has passed."))
        );
        assert_eq!(store.state.read().await.solutions.len(), 1);

        clock.set(before_deadline());
        store.commit(plan).await.unwrap();
        assert_eq!(store.state.read().await.solutions.len(), 2);
    }

    #[tokio::test]
    async fn test_deactivated_actor_cannot_commit() {
        let (store, world, _) = seeded().await;
        store
            .state
            .write()
            .await
            .users
            .get_mut(&world.teacher.id)
            .unwrap()
            .is_active = false;

        let err = store
            .commit(add_student_plan(&world, UserId::new()))
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(&Rejection::denied("Your account is inactive.")));
    }

    #[tokio::test]
    async fn test_add_lesson_reuses_catalog_entry() {
        let (store, world, _) = seeded().await;
        let other_class = Class {
            id: ClassId::new(),
            lesson_ids: Vec::new(),
            ..world.class.clone()
        };
        store
            .commit(Plan::staff(Mutation::CreateClass(other_class.clone()), deadline()))
            .await
            .unwrap();

        let plan = Plan::new(
            world.manager.id,
            Mutation::AddLesson {
                class_id: other_class.id,
                name: world.lesson.name.clone(),
            },
            deadline(),
        )
        .require(Precondition::LessonNameFree {
            class_id: other_class.id,
            name: world.lesson.name.clone(),
        });
        let lesson = store.commit(plan.clone()).await.unwrap().into_lesson().unwrap();
        assert_eq!(lesson.id, world.lesson.id);

        let err = store.commit(plan).await.unwrap_err();
        assert!(matches!(err.rejection(), Some(Rejection::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_class_cascades() {
        let (store, world, _) = seeded().await;
        store
            .commit(Plan::new(
                world.manager.id,
                Mutation::DeleteClass {
                    class_id: world.class.id,
                },
                deadline(),
            ))
            .await
            .unwrap();

        let state = store.state.read().await;
        assert!(state.assignments.is_empty());
        assert!(state.solutions.is_empty());
        assert_eq!(state.news.len(), 1);
    }

    #[tokio::test]
    async fn test_grade_records_time() {
        let (store, world, clock) = seeded().await;
        clock.set(after_deadline());
        let grade = classbook_models::Grade::new(80.0).unwrap();
        let solution = store
            .commit(Plan::new(
                world.teacher.id,
                Mutation::GradeSolution {
                    solution_id: world.solution.id,
                    grade,
                },
                after_deadline(),
            ))
            .await
            .unwrap()
            .into_solution()
            .unwrap();
        assert_eq!(solution.grade, Some(grade));
        assert_eq!(solution.graded_at, Some(after_deadline()));
    }

    #[tokio::test]
    async fn test_news_scan_covers_class_and_school_news() {
        let (store, world, _) = seeded().await;
        let chains = store
            .scan(Scan::NewsInSchools(vec![world.school.id]))
            .await
            .unwrap();
        assert_eq!(chains.len(), 2);
        assert!(store
            .scan(Scan::NewsInSchools(vec![SchoolId::new()]))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_school_manager_is_one_to_one() {
        let (store, world, _) = seeded().await;
        let second = School {
            id: SchoolId::new(),
            ..world.school.clone()
        };
        let err = store.insert_school(second).await.unwrap_err();
        assert!(matches!(err.rejection(), Some(Rejection::Conflict(_))));
    }
}
