//! PostgreSQL implementation of [`Store`].
//!
//! Commits run in one transaction. Every precondition fact is read with a
//! row lock (`FOR UPDATE` on the class, assignment, school or solution it
//! concerns), so two requests racing on the same entity serialize and the
//! second one re-checks against what the first committed. Deadline facts are
//! checked against the database clock once those locks are held.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, instrument};

use classbook_authz::{
    ActorContext, Chain, ClassMembership, Committed, Fact, Mutation, Plan, Precondition,
    ResourceKind, ResourceRef, Scan, Store,
};
use classbook_core::{AppError, Rejection};
use classbook_models::{
    Assignment, AssignmentId, Class, ClassId, Lesson, LessonId, NationalId, News, NewsId, Role,
    School, SchoolId, Solution, SolutionId, User, UserId,
};

const CLASS_SELECT: &str = r#"
    SELECT c.id, c.name, c.school_id, c.teacher_id, c.created_at,
           ARRAY(SELECT cs.student_id FROM class_students cs WHERE cs.class_id = c.id) AS student_ids,
           ARRAY(SELECT cl.lesson_id FROM class_lessons cl WHERE cl.class_id = c.id) AS lesson_ids
    FROM classes c"#;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn not_found(kind: ResourceKind) -> Rejection {
    Rejection::not_found(format!("{} not found.", kind))
}

/// Maps constraint violations to rejections; anything else stays internal.
fn write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return Rejection::conflict("This resource already exists.").into();
        }
        if db.is_foreign_key_violation() {
            return Rejection::not_found("A referenced resource does not exist.").into();
        }
        if db.is_check_violation() {
            return Rejection::validation("The change violates a data constraint.").into();
        }
    }
    AppError::database(err)
}

async fn class(conn: &mut PgConnection, id: ClassId) -> Result<Option<Class>, sqlx::Error> {
    let sql = format!("{} WHERE c.id = $1", CLASS_SELECT);
    sqlx::query_as::<_, Class>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
}

async fn classes_by_ids(
    conn: &mut PgConnection,
    ids: &[ClassId],
) -> Result<HashMap<ClassId, Class>, sqlx::Error> {
    let sql = format!("{} WHERE c.id = ANY($1)", CLASS_SELECT);
    let classes = sqlx::query_as::<_, Class>(&sql)
        .bind(ids)
        .fetch_all(conn)
        .await?;
    Ok(classes.into_iter().map(|c| (c.id, c)).collect())
}

async fn assignments_by_ids(
    conn: &mut PgConnection,
    ids: &[AssignmentId],
) -> Result<HashMap<AssignmentId, Assignment>, sqlx::Error> {
    let assignments =
        sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(conn)
            .await?;
    Ok(assignments.into_iter().map(|a| (a.id, a)).collect())
}

async fn assignment_chains(
    conn: &mut PgConnection,
    assignments: Vec<Assignment>,
) -> Result<Vec<Chain>, sqlx::Error> {
    let class_ids: Vec<ClassId> = assignments.iter().map(|a| a.class_id).collect();
    let classes = classes_by_ids(conn, &class_ids).await?;

    Ok(assignments
        .into_iter()
        .filter_map(|assignment| {
            let class = classes.get(&assignment.class_id)?.clone();
            Some(Chain::Assignment { assignment, class })
        })
        .collect())
}

async fn solution_chains(
    conn: &mut PgConnection,
    solutions: Vec<Solution>,
) -> Result<Vec<Chain>, sqlx::Error> {
    let assignment_ids: Vec<AssignmentId> = solutions.iter().map(|s| s.assignment_id).collect();
    let assignments = assignments_by_ids(&mut *conn, &assignment_ids).await?;
    let class_ids: Vec<ClassId> = assignments.values().map(|a| a.class_id).collect();
    let classes = classes_by_ids(&mut *conn, &class_ids).await?;

    Ok(solutions
        .into_iter()
        .filter_map(|solution| {
            let assignment = assignments.get(&solution.assignment_id)?.clone();
            let class = classes.get(&assignment.class_id)?.clone();
            Some(Chain::Solution {
                solution,
                assignment,
                class,
            })
        })
        .collect())
}

async fn news_chains(
    conn: &mut PgConnection,
    news: Vec<News>,
) -> Result<Vec<Chain>, sqlx::Error> {
    let class_ids: Vec<ClassId> = news.iter().filter_map(|n| n.class_id).collect();
    let classes = classes_by_ids(conn, &class_ids).await?;

    Ok(news
        .into_iter()
        .filter_map(|news| match (news.class_id, news.school_id) {
            (Some(class_id), _) => {
                let class = classes.get(&class_id)?.clone();
                Some(Chain::News {
                    school_id: class.school_id,
                    class: Some(class),
                    news,
                })
            }
            (None, Some(school_id)) => Some(Chain::News {
                news,
                class: None,
                school_id,
            }),
            (None, None) => None,
        })
        .collect())
}

async fn lock_class(conn: &mut PgConnection, id: ClassId) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, ClassId>("SELECT id FROM classes WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

async fn fact(conn: &mut PgConnection, precondition: &Precondition) -> Result<Fact, sqlx::Error> {
    let fact = match precondition {
        Precondition::ActorActive(user_id) => {
            let active =
                sqlx::query_scalar::<_, bool>("SELECT is_active FROM users WHERE id = $1 FOR SHARE")
                    .bind(*user_id)
                    .fetch_optional(conn)
                    .await?;
            Fact::Holds(active.unwrap_or(false))
        }
        Precondition::ClassTeacher { class_id, user_id } => {
            let teacher = sqlx::query_scalar::<_, Option<UserId>>(
                "SELECT teacher_id FROM classes WHERE id = $1 FOR UPDATE",
            )
            .bind(*class_id)
            .fetch_optional(conn)
            .await?;
            match teacher {
                Some(teacher) => Fact::Holds(teacher == Some(*user_id)),
                None => Fact::Missing(ResourceKind::Class),
            }
        }
        Precondition::ClassStudent { class_id, user_id }
        | Precondition::StudentMembership {
            class_id,
            student_id: user_id,
            ..
        } => {
            if !lock_class(&mut *conn, *class_id).await? {
                return Ok(Fact::Missing(ResourceKind::Class));
            }
            let member = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM class_students WHERE class_id = $1 AND student_id = $2)",
            )
            .bind(*class_id)
            .bind(*user_id)
            .fetch_one(conn)
            .await?;
            Fact::Holds(member)
        }
        Precondition::LessonOffered {
            class_id,
            lesson_id,
        } => {
            if !lock_class(&mut *conn, *class_id).await? {
                return Ok(Fact::Missing(ResourceKind::Class));
            }
            let offered = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM class_lessons WHERE class_id = $1 AND lesson_id = $2)",
            )
            .bind(*class_id)
            .bind(*lesson_id)
            .fetch_one(conn)
            .await?;
            Fact::Holds(offered)
        }
        Precondition::LessonNameFree { class_id, name } => {
            if !lock_class(&mut *conn, *class_id).await? {
                return Ok(Fact::Missing(ResourceKind::Class));
            }
            let offered = sqlx::query_scalar::<_, bool>(
                r#"SELECT EXISTS(
                       SELECT 1 FROM class_lessons cl JOIN lessons l ON l.id = cl.lesson_id
                       WHERE cl.class_id = $1 AND l.name = $2)"#,
            )
            .bind(*class_id)
            .bind(name)
            .fetch_one(conn)
            .await?;
            Fact::Holds(offered)
        }
        Precondition::SchoolManager { school_id, user_id } => {
            let manager = sqlx::query_scalar::<_, Option<UserId>>(
                "SELECT manager_id FROM schools WHERE id = $1 FOR UPDATE",
            )
            .bind(*school_id)
            .fetch_optional(conn)
            .await?;
            match manager {
                Some(manager) => Fact::Holds(manager == Some(*user_id)),
                None => Fact::Missing(ResourceKind::School),
            }
        }
        Precondition::Deadline { assignment_id, .. } => {
            let deadline = sqlx::query_scalar::<_, DateTime<Utc>>(
                "SELECT deadline FROM assignments WHERE id = $1 FOR UPDATE",
            )
            .bind(*assignment_id)
            .fetch_optional(conn)
            .await?;
            deadline.map_or(Fact::Missing(ResourceKind::Assignment), Fact::Deadline)
        }
        Precondition::SolutionAuthor {
            solution_id,
            student_id,
        } => {
            let author = sqlx::query_scalar::<_, UserId>(
                "SELECT student_id FROM solutions WHERE id = $1 FOR UPDATE",
            )
            .bind(*solution_id)
            .fetch_optional(conn)
            .await?;
            author.map_or(Fact::Missing(ResourceKind::Solution), |author| {
                Fact::Holds(author == *student_id)
            })
        }
        Precondition::SingleSubmission {
            assignment_id,
            student_id,
        } => {
            let locked = sqlx::query_scalar::<_, AssignmentId>(
                "SELECT id FROM assignments WHERE id = $1 FOR UPDATE",
            )
            .bind(*assignment_id)
            .fetch_optional(&mut *conn)
            .await?;
            if locked.is_none() {
                return Ok(Fact::Missing(ResourceKind::Assignment));
            }
            let count = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM solutions WHERE assignment_id = $1 AND student_id = $2",
            )
            .bind(*assignment_id)
            .bind(*student_id)
            .fetch_one(conn)
            .await?;
            Fact::Count(count.max(0) as usize)
        }
        Precondition::Exists(target) => {
            let (table, id) = match target {
                ResourceRef::School(id) => ("schools", id.into_inner()),
                ResourceRef::Class(id) => ("classes", id.into_inner()),
                ResourceRef::Assignment(id) => ("assignments", id.into_inner()),
                ResourceRef::Solution(id) => ("solutions", id.into_inner()),
                ResourceRef::News(id) => ("news", id.into_inner()),
            };
            let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", table);
            let exists = sqlx::query_scalar::<_, bool>(&sql)
                .bind(id)
                .fetch_one(conn)
                .await?;
            if exists {
                Fact::Holds(true)
            } else {
                Fact::Missing(target.kind())
            }
        }
    };

    Ok(fact)
}

async fn apply(
    conn: &mut PgConnection,
    mutation: Mutation,
    now: DateTime<Utc>,
) -> Result<Committed, AppError> {
    let committed = match mutation {
        Mutation::CreateClass(new) => {
            sqlx::query(
                "INSERT INTO classes (id, name, school_id, teacher_id, created_at) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(new.id)
            .bind(&new.name)
            .bind(new.school_id)
            .bind(new.teacher_id)
            .bind(new.created_at)
            .execute(&mut *conn)
            .await
            .map_err(write_error)?;
            let created = class(conn, new.id)
                .await?
                .ok_or_else(|| not_found(ResourceKind::Class))?;
            Committed::Class(created)
        }
        Mutation::UpdateClass {
            class_id,
            name,
            teacher_id,
        } => {
            sqlx::query(
                r#"UPDATE classes
                   SET name = COALESCE($2, name), teacher_id = COALESCE($3, teacher_id)
                   WHERE id = $1"#,
            )
            .bind(class_id)
            .bind(name)
            .bind(teacher_id)
            .execute(&mut *conn)
            .await
            .map_err(write_error)?;
            Committed::Class(reload_class(conn, class_id).await?)
        }
        Mutation::DeleteClass { class_id } => {
            let result = sqlx::query("DELETE FROM classes WHERE id = $1")
                .bind(class_id)
                .execute(conn)
                .await?;
            if result.rows_affected() == 0 {
                return Err(not_found(ResourceKind::Class).into());
            }
            Committed::Deleted
        }
        Mutation::AddStudent {
            class_id,
            student_id,
        } => {
            sqlx::query(
                "INSERT INTO class_students (class_id, student_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(class_id)
            .bind(student_id)
            .execute(&mut *conn)
            .await
            .map_err(write_error)?;
            Committed::Class(reload_class(conn, class_id).await?)
        }
        Mutation::RemoveStudent {
            class_id,
            student_id,
        } => {
            sqlx::query("DELETE FROM class_students WHERE class_id = $1 AND student_id = $2")
                .bind(class_id)
                .bind(student_id)
                .execute(&mut *conn)
                .await?;
            Committed::Class(reload_class(conn, class_id).await?)
        }
        Mutation::AddLesson { class_id, name } => {
            sqlx::query("INSERT INTO lessons (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
                .bind(LessonId::new())
                .bind(&name)
                .execute(&mut *conn)
                .await?;
            let lesson = sqlx::query_as::<_, Lesson>("SELECT id, name FROM lessons WHERE name = $1")
                .bind(&name)
                .fetch_one(&mut *conn)
                .await?;
            sqlx::query(
                "INSERT INTO class_lessons (class_id, lesson_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(class_id)
            .bind(lesson.id)
            .execute(conn)
            .await
            .map_err(write_error)?;
            Committed::Lesson(lesson)
        }
        Mutation::CreateAssignment(assignment) => {
            sqlx::query(
                r#"INSERT INTO assignments
                   (id, title, context, attachment, grade_max, deadline, answer_text, answer_file,
                    lesson_id, class_id, created_at, last_modified)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
            )
            .bind(assignment.id)
            .bind(&assignment.title)
            .bind(&assignment.context)
            .bind(&assignment.attachment)
            .bind(assignment.grade_max)
            .bind(assignment.deadline)
            .bind(&assignment.answer_text)
            .bind(&assignment.answer_file)
            .bind(assignment.lesson_id)
            .bind(assignment.class_id)
            .bind(assignment.created_at)
            .bind(assignment.last_modified)
            .execute(conn)
            .await
            .map_err(write_error)?;
            Committed::Assignment(assignment)
        }
        Mutation::UpdateAssignment {
            assignment_id,
            changes,
        } => {
            let updated = sqlx::query_as::<_, Assignment>(
                r#"UPDATE assignments
                   SET title = COALESCE($2, title),
                       context = COALESCE($3, context),
                       attachment = COALESCE($4, attachment),
                       deadline = COALESCE($5, deadline),
                       last_modified = $6
                   WHERE id = $1
                   RETURNING *"#,
            )
            .bind(assignment_id)
            .bind(changes.title)
            .bind(changes.context)
            .bind(changes.attachment)
            .bind(changes.deadline)
            .bind(now)
            .fetch_optional(conn)
            .await
            .map_err(write_error)?
            .ok_or_else(|| not_found(ResourceKind::Assignment))?;
            Committed::Assignment(updated)
        }
        Mutation::AddAnswer {
            assignment_id,
            answer,
        } => {
            let updated = sqlx::query_as::<_, Assignment>(
                r#"UPDATE assignments
                   SET answer_text = COALESCE($2, answer_text),
                       answer_file = COALESCE($3, answer_file),
                       last_modified = $4
                   WHERE id = $1
                   RETURNING *"#,
            )
            .bind(assignment_id)
            .bind(answer.text)
            .bind(answer.file)
            .bind(now)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| not_found(ResourceKind::Assignment))?;
            Committed::Assignment(updated)
        }
        Mutation::SubmitSolution(solution) => {
            sqlx::query(
                r#"INSERT INTO solutions
                   (id, context, attachment, grade, graded_at, student_id, assignment_id, created_at, last_modified)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
            )
            .bind(solution.id)
            .bind(&solution.context)
            .bind(&solution.attachment)
            .bind(solution.grade)
            .bind(solution.graded_at)
            .bind(solution.student_id)
            .bind(solution.assignment_id)
            .bind(solution.created_at)
            .bind(solution.last_modified)
            .execute(conn)
            .await
            .map_err(write_error)?;
            Committed::Solution(solution)
        }
        Mutation::UpdateSolution { solution_id, body } => {
            let updated = sqlx::query_as::<_, Solution>(
                r#"UPDATE solutions
                   SET context = $2, attachment = $3, last_modified = $4
                   WHERE id = $1
                   RETURNING *"#,
            )
            .bind(solution_id)
            .bind(body.context)
            .bind(body.attachment)
            .bind(now)
            .fetch_optional(conn)
            .await
            .map_err(write_error)?
            .ok_or_else(|| not_found(ResourceKind::Solution))?;
            Committed::Solution(updated)
        }
        Mutation::GradeSolution { solution_id, grade } => {
            let updated = sqlx::query_as::<_, Solution>(
                r#"UPDATE solutions
                   SET grade = $2, graded_at = $3, last_modified = $3
                   WHERE id = $1
                   RETURNING *"#,
            )
            .bind(solution_id)
            .bind(grade)
            .bind(now)
            .fetch_optional(conn)
            .await
            .map_err(write_error)?
            .ok_or_else(|| not_found(ResourceKind::Solution))?;
            Committed::Solution(updated)
        }
        Mutation::CreateNews(news) => {
            sqlx::query(
                r#"INSERT INTO news
                   (id, title, context, creator_id, school_id, class_id, created_at, last_modified)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
            )
            .bind(news.id)
            .bind(&news.title)
            .bind(&news.context)
            .bind(news.creator_id)
            .bind(news.school_id)
            .bind(news.class_id)
            .bind(news.created_at)
            .bind(news.last_modified)
            .execute(conn)
            .await
            .map_err(write_error)?;
            Committed::News(news)
        }
        Mutation::UpdateNews {
            news_id,
            title,
            context,
        } => {
            let updated = sqlx::query_as::<_, News>(
                r#"UPDATE news
                   SET title = COALESCE($2, title), context = COALESCE($3, context), last_modified = $4
                   WHERE id = $1
                   RETURNING *"#,
            )
            .bind(news_id)
            .bind(title)
            .bind(context)
            .bind(now)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| not_found(ResourceKind::News))?;
            Committed::News(updated)
        }
        Mutation::DeleteNews { news_id } => {
            let result = sqlx::query("DELETE FROM news WHERE id = $1")
                .bind(news_id)
                .execute(conn)
                .await?;
            if result.rows_affected() == 0 {
                return Err(not_found(ResourceKind::News).into());
            }
            Committed::Deleted
        }
        Mutation::UpdateProfile { user_id, bio } => {
            let user = sqlx::query_as::<_, User>(
                "UPDATE users SET bio = $2 WHERE id = $1 RETURNING *",
            )
            .bind(user_id)
            .bind(bio)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| Rejection::not_found("User not found."))?;
            Committed::User(user)
        }
    };

    Ok(committed)
}

async fn reload_class(conn: &mut PgConnection, id: ClassId) -> Result<Class, AppError> {
    class(conn, id)
        .await?
        .ok_or_else(|| not_found(ResourceKind::Class).into())
}

#[async_trait]
impl Store for PgStore {
    #[instrument(skip(self))]
    async fn actor(&self, user_id: UserId) -> Result<Option<ActorContext>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let Some(user) = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?
        else {
            return Ok(None);
        };

        let managed_school =
            sqlx::query_scalar::<_, SchoolId>("SELECT id FROM schools WHERE manager_id = $1")
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?;

        let taught = sqlx::query_as::<_, (ClassId, SchoolId)>(
            "SELECT id, school_id FROM classes WHERE teacher_id = $1",
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        let attended = sqlx::query_as::<_, (ClassId, SchoolId)>(
            r#"SELECT c.id, c.school_id FROM classes c
               JOIN class_students cs ON cs.class_id = c.id
               WHERE cs.student_id = $1"#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        let membership = |(class_id, school_id): (ClassId, SchoolId)| ClassMembership {
            class_id,
            school_id,
        };

        Ok(Some(ActorContext {
            user,
            managed_school,
            taught_classes: taught.into_iter().map(membership).collect(),
            attended_classes: attended.into_iter().map(membership).collect(),
        }))
    }

    #[instrument(skip(self))]
    async fn load(&self, target: ResourceRef) -> Result<Option<Chain>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let chain = match target {
            ResourceRef::School(id) => {
                sqlx::query_as::<_, School>("SELECT * FROM schools WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?
                    .map(Chain::School)
            }
            ResourceRef::Class(id) => class(&mut conn, id).await?.map(Chain::Class),
            ResourceRef::Assignment(id) => {
                let assignments =
                    sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE id = $1")
                        .bind(id)
                        .fetch_all(&mut *conn)
                        .await?;
                assignment_chains(&mut conn, assignments).await?.pop()
            }
            ResourceRef::Solution(id) => {
                let solutions =
                    sqlx::query_as::<_, Solution>("SELECT * FROM solutions WHERE id = $1")
                        .bind(id)
                        .fetch_all(&mut *conn)
                        .await?;
                solution_chains(&mut conn, solutions).await?.pop()
            }
            ResourceRef::News(id) => {
                let news = sqlx::query_as::<_, News>("SELECT * FROM news WHERE id = $1")
                    .bind(id)
                    .fetch_all(&mut *conn)
                    .await?;
                news_chains(&mut conn, news).await?.pop()
            }
        };

        Ok(chain)
    }

    #[instrument(skip(self))]
    async fn scan(&self, scan: Scan) -> Result<Vec<Chain>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let chains = match scan {
            Scan::ClassesInSchools(schools) => {
                let sql = format!(
                    "{} WHERE c.school_id = ANY($1) ORDER BY c.created_at, c.id",
                    CLASS_SELECT
                );
                sqlx::query_as::<_, Class>(&sql)
                    .bind(&schools)
                    .fetch_all(&mut *conn)
                    .await?
                    .into_iter()
                    .map(Chain::Class)
                    .collect()
            }
            Scan::AssignmentsInClasses(classes) => {
                let assignments = sqlx::query_as::<_, Assignment>(
                    "SELECT * FROM assignments WHERE class_id = ANY($1) ORDER BY created_at, id",
                )
                .bind(&classes)
                .fetch_all(&mut *conn)
                .await?;
                assignment_chains(&mut conn, assignments).await?
            }
            Scan::SolutionsInClasses(classes) => {
                let solutions = sqlx::query_as::<_, Solution>(
                    r#"SELECT s.* FROM solutions s
                       JOIN assignments a ON a.id = s.assignment_id
                       WHERE a.class_id = ANY($1)
                       ORDER BY s.created_at, s.id"#,
                )
                .bind(&classes)
                .fetch_all(&mut *conn)
                .await?;
                solution_chains(&mut conn, solutions).await?
            }
            Scan::SolutionsOfAssignment(assignment_id) => {
                let solutions = sqlx::query_as::<_, Solution>(
                    "SELECT * FROM solutions WHERE assignment_id = $1 ORDER BY created_at, id",
                )
                .bind(assignment_id)
                .fetch_all(&mut *conn)
                .await?;
                solution_chains(&mut conn, solutions).await?
            }
            Scan::NewsInSchools(schools) => {
                let news = sqlx::query_as::<_, News>(
                    r#"SELECT n.* FROM news n
                       LEFT JOIN classes c ON c.id = n.class_id
                       WHERE n.school_id = ANY($1) OR c.school_id = ANY($1)
                       ORDER BY n.created_at, n.id"#,
                )
                .bind(&schools)
                .fetch_all(&mut *conn)
                .await?;
                news_chains(&mut conn, news).await?
            }
        };

        Ok(chains)
    }

    async fn users(&self, ids: &[UserId]) -> Result<Vec<User>, AppError> {
        let users =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1) ORDER BY username")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;
        Ok(users)
    }

    async fn student_by_national_id(
        &self,
        national_id: &NationalId,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE national_id = $1 AND role = $2",
        )
        .bind(national_id)
        .bind(Role::Student)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn lessons(&self, ids: &[LessonId]) -> Result<Vec<Lesson>, AppError> {
        let lessons = sqlx::query_as::<_, Lesson>(
            "SELECT id, name FROM lessons WHERE id = ANY($1) ORDER BY name",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(lessons)
    }

    async fn lesson_by_name(&self, name: &str) -> Result<Option<Lesson>, AppError> {
        let lesson = sqlx::query_as::<_, Lesson>("SELECT id, name FROM lessons WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lesson)
    }

    #[instrument(skip(self, plan), fields(mutation = plan.mutation.name()))]
    async fn commit(&self, plan: Plan) -> Result<Committed, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut facts = Vec::with_capacity(plan.preconditions.len());
        for precondition in &plan.preconditions {
            facts.push(fact(&mut tx, precondition).await?);
        }
        // read after the row locks are held; now() would be the transaction start
        let at = sqlx::query_scalar::<_, DateTime<Utc>>("SELECT clock_timestamp()")
            .fetch_one(&mut *tx)
            .await?;

        for (precondition, fact) in plan.preconditions.iter().zip(&facts) {
            if let Err(rejection) = precondition.check(fact, at) {
                debug!(?precondition, %rejection, "Commit refused");
                return Err(rejection.into());
            }
        }

        let mutation = plan.mutation.name();
        let committed = apply(&mut tx, plan.mutation, plan.now).await?;
        tx.commit().await?;

        info!(mutation, "Committed");
        Ok(committed)
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn insert_user(&self, user: User) -> Result<User, AppError> {
        sqlx::query(
            r#"INSERT INTO users
               (id, username, first_name, last_name, email, national_id, role, bio, is_active, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.national_id)
        .bind(user.role)
        .bind(&user.bio)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match write_error(err) {
            e if e.rejection().is_some_and(|r| matches!(r, Rejection::Conflict(_))) => {
                Rejection::conflict(
                    "A user with this username, email or national id already exists.",
                )
                .into()
            }
            e => e,
        })?;
        Ok(user)
    }

    #[instrument(skip(self, school), fields(name = %school.name))]
    async fn insert_school(&self, school: School) -> Result<School, AppError> {
        if let Some(manager_id) = school.manager_id {
            let role = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = $1")
                .bind(manager_id)
                .fetch_optional(&self.pool)
                .await?;
            if role != Some(Role::Manager) {
                return Err(Rejection::validation(
                    "The school manager must be a user with the manager role.",
                )
                .into());
            }
        }

        sqlx::query("INSERT INTO schools (id, name, manager_id, created_at) VALUES ($1, $2, $3, $4)")
            .bind(school.id)
            .bind(&school.name)
            .bind(school.manager_id)
            .bind(school.created_at)
            .execute(&self.pool)
            .await
            .map_err(|err| match write_error(err) {
                e if e.rejection().is_some_and(|r| matches!(r, Rejection::Conflict(_))) => {
                    Rejection::conflict("This manager already runs a school.").into()
                }
                e => e,
            })?;
        Ok(school)
    }

    #[instrument(skip(self))]
    async fn set_user_active(&self, user_id: UserId, active: bool) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET is_active = $2 WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Rejection::not_found("User not found."))?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use classbook_authz::DeadlineWindow;
    use classbook_models::Grade;

    fn user(role: Role) -> User {
        let id = UserId::new();
        let digits = format!("{:010}", id.into_inner().as_u128() % 10_000_000_000);
        User {
            id,
            username: format!("{}-{}", role, digits),
            first_name: "Test".to_string(),
            last_name: role.to_string(),
            email: format!("{}@example.com", digits),
            national_id: NationalId::new(digits).unwrap(),
            role,
            bio: None,
            is_active: true,
            created_at: Utc::now() - Duration::days(30),
        }
    }

    struct Seed {
        store: PgStore,
        teacher: User,
        student: User,
        class: Class,
        lesson: Lesson,
    }

    async fn seed(pool: PgPool) -> Seed {
        let store = PgStore::new(pool);
        let manager = store.insert_user(user(Role::Manager)).await.unwrap();
        let teacher = store.insert_user(user(Role::Teacher)).await.unwrap();
        let student = store.insert_user(user(Role::Student)).await.unwrap();
        let school = store
            .insert_school(School {
                id: SchoolId::new(),
                name: "Riverside".to_string(),
                manager_id: Some(manager.id),
                created_at: Utc::now() - Duration::days(30),
            })
            .await
            .unwrap();

        let class_id = ClassId::new();
        let staff = |mutation| Plan::staff(mutation, Utc::now());
        store
            .commit(staff(Mutation::CreateClass(Class {
                id: class_id,
                name: "7A".to_string(),
                school_id: school.id,
                teacher_id: Some(teacher.id),
                student_ids: Vec::new(),
                lesson_ids: Vec::new(),
                created_at: Utc::now() - Duration::days(30),
            })))
            .await
            .unwrap();
        store
            .commit(staff(Mutation::AddStudent {
                class_id,
                student_id: student.id,
            }))
            .await
            .unwrap();
        let lesson = store
            .commit(staff(Mutation::AddLesson {
                class_id,
                name: "Physics".to_string(),
            }))
            .await
            .unwrap()
            .into_lesson()
            .unwrap();
        let class = reload_class(&mut *store.pool.acquire().await.unwrap(), class_id)
            .await
            .unwrap();

        Seed {
            store,
            teacher,
            student,
            class,
            lesson,
        }
    }

    async fn assignment_due(seed: &Seed, deadline: DateTime<Utc>) -> Assignment {
        let created = deadline - Duration::days(7);
        seed.store
            .commit(Plan::staff(
                Mutation::CreateAssignment(Assignment {
                    id: AssignmentId::new(),
                    title: "Optics".to_string(),
                    context: None,
                    attachment: None,
                    grade_max: 100.0,
                    deadline,
                    answer_text: None,
                    answer_file: None,
                    lesson_id: seed.lesson.id,
                    class_id: seed.class.id,
                    created_at: created,
                    last_modified: created,
                }),
                created,
            ))
            .await
            .unwrap()
            .into_assignment()
            .unwrap()
    }

    fn solution(assignment: &Assignment, student_id: UserId) -> Solution {
        let created = assignment.created_at + Duration::hours(1);
        Solution {
            id: SolutionId::new(),
            context: Some("Snell's law".to_string()),
            attachment: None,
            grade: None,
            graded_at: None,
            student_id,
            assignment_id: assignment.id,
            created_at: created,
            last_modified: created,
        }
    }

    fn submit_plan(assignment: &Assignment, solution: Solution, now: DateTime<Utc>) -> Plan {
        let student_id = solution.student_id;
        Plan::new(student_id, Mutation::SubmitSolution(solution), now)
            .require(Precondition::ClassStudent {
                class_id: assignment.class_id,
                user_id: student_id,
            })
            .require(Precondition::Deadline {
                assignment_id: assignment.id,
                window: DeadlineWindow::Before,
            })
            .require(Precondition::SingleSubmission {
                assignment_id: assignment.id,
                student_id,
            })
    }

    fn grade_plan(seed: &Seed, assignment: &Assignment, solution_id: SolutionId) -> Plan {
        Plan::new(
            seed.teacher.id,
            Mutation::GradeSolution {
                solution_id,
                grade: Grade::new(95.55).unwrap(),
            },
            Utc::now(),
        )
        .require(Precondition::ClassTeacher {
            class_id: seed.class.id,
            user_id: seed.teacher.id,
        })
        .require(Precondition::Deadline {
            assignment_id: assignment.id,
            window: DeadlineWindow::After,
        })
    }

    fn rejection(err: &AppError) -> Rejection {
        err.rejection().cloned().unwrap()
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_commit_refused_when_membership_changed(pool: PgPool) {
        let seed = seed(pool).await;
        let newcomer = seed.store.insert_user(user(Role::Student)).await.unwrap();

        // authorized while the newcomer was still outside the class
        let plan = Plan::new(
            seed.teacher.id,
            Mutation::AddStudent {
                class_id: seed.class.id,
                student_id: newcomer.id,
            },
            Utc::now(),
        )
        .require(Precondition::StudentMembership {
            class_id: seed.class.id,
            student_id: newcomer.id,
            expect_member: false,
        });

        seed.store.commit(plan.clone()).await.unwrap();
        let err = seed.store.commit(plan).await.unwrap_err();
        assert!(matches!(rejection(&err), Rejection::Conflict(_)));

        let class = reload_class(&mut *seed.store.pool.acquire().await.unwrap(), seed.class.id)
            .await
            .unwrap();
        assert_eq!(class.student_ids.len(), 2);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_removed_student_cannot_submit(pool: PgPool) {
        let seed = seed(pool).await;
        let assignment = assignment_due(&seed, Utc::now() + Duration::days(1)).await;
        let plan = submit_plan(
            &assignment,
            solution(&assignment, seed.student.id),
            Utc::now(),
        );

        seed.store
            .commit(Plan::staff(
                Mutation::RemoveStudent {
                    class_id: seed.class.id,
                    student_id: seed.student.id,
                },
                Utc::now(),
            ))
            .await
            .unwrap();

        let err = seed.store.commit(plan).await.unwrap_err();
        assert!(matches!(rejection(&err), Rejection::Denied(_)));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_single_submission_per_student(pool: PgPool) {
        let seed = seed(pool).await;
        let assignment = assignment_due(&seed, Utc::now() + Duration::days(1)).await;

        let first = seed
            .store
            .commit(submit_plan(
                &assignment,
                solution(&assignment, seed.student.id),
                Utc::now(),
            ))
            .await
            .unwrap()
            .into_solution()
            .unwrap();
        assert_eq!(first.student_id, seed.student.id);

        let err = seed
            .store
            .commit(submit_plan(
                &assignment,
                solution(&assignment, seed.student.id),
                Utc::now(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(rejection(&err), Rejection::Conflict(_)));

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM solutions WHERE assignment_id = $1",
        )
        .bind(assignment.id)
        .fetch_one(&seed.store.pool)
        .await
        .unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_submission_checked_against_database_clock(pool: PgPool) {
        let seed = seed(pool).await;
        let deadline = Utc::now() - Duration::minutes(1);
        let assignment = assignment_due(&seed, deadline).await;

        // the request instant still lies before the deadline
        let plan = submit_plan(
            &assignment,
            solution(&assignment, seed.student.id),
            deadline - Duration::hours(1),
        );
        let err = seed.store.commit(plan).await.unwrap_err();
        assert!(matches!(rejection(&err), Rejection::InvalidTransition(_)));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_grading_waits_for_deadline(pool: PgPool) {
        let seed = seed(pool).await;
        let open = assignment_due(&seed, Utc::now() + Duration::hours(1)).await;
        let submitted = seed
            .store
            .commit(submit_plan(
                &open,
                solution(&open, seed.student.id),
                Utc::now(),
            ))
            .await
            .unwrap()
            .into_solution()
            .unwrap();

        let err = seed
            .store
            .commit(grade_plan(&seed, &open, submitted.id))
            .await
            .unwrap_err();
        assert!(matches!(rejection(&err), Rejection::InvalidTransition(_)));

        let stored = sqlx::query_as::<_, Solution>("SELECT * FROM solutions WHERE id = $1")
            .bind(submitted.id)
            .fetch_one(&seed.store.pool)
            .await
            .unwrap();
        assert_eq!(stored.grade, None);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_grade_stored_with_two_decimals(pool: PgPool) {
        let seed = seed(pool).await;
        let closed = assignment_due(&seed, Utc::now() - Duration::minutes(1)).await;
        let late = solution(&closed, seed.student.id);
        seed.store
            .commit(Plan::staff(Mutation::SubmitSolution(late.clone()), Utc::now()))
            .await
            .unwrap();

        let graded = seed
            .store
            .commit(grade_plan(&seed, &closed, late.id))
            .await
            .unwrap()
            .into_solution()
            .unwrap();
        assert_eq!(graded.grade, Some(Grade::new(95.55).unwrap()));
        assert!(graded.graded_at.is_some());

        let text = sqlx::query_scalar::<_, String>("SELECT grade::text FROM solutions WHERE id = $1")
            .bind(late.id)
            .fetch_one(&seed.store.pool)
            .await
            .unwrap();
        assert_eq!(text, "95.55");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_delete_class_cascades(pool: PgPool) {
        let seed = seed(pool).await;
        let assignment = assignment_due(&seed, Utc::now() + Duration::days(1)).await;
        let submitted = solution(&assignment, seed.student.id);
        seed.store
            .commit(submit_plan(&assignment, submitted.clone(), Utc::now()))
            .await
            .unwrap();

        seed.store
            .commit(Plan::staff(
                Mutation::DeleteClass {
                    class_id: seed.class.id,
                },
                Utc::now(),
            ))
            .await
            .unwrap();

        for target in [
            ResourceRef::Class(seed.class.id),
            ResourceRef::Assignment(assignment.id),
            ResourceRef::Solution(submitted.id),
        ] {
            assert!(seed.store.load(target).await.unwrap().is_none());
        }
        let memberships = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM class_students WHERE class_id = $1",
        )
        .bind(seed.class.id)
        .fetch_one(&seed.store.pool)
        .await
        .unwrap();
        assert_eq!(memberships, 0);

        let student = seed.store.actor(seed.student.id).await.unwrap().unwrap();
        assert!(student.attended_classes.is_empty());
        assert!(seed.store.lesson_by_name("Physics").await.unwrap().is_some());

        let err = seed
            .store
            .commit(Plan::staff(
                Mutation::DeleteClass {
                    class_id: seed.class.id,
                },
                Utc::now(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(rejection(&err), Rejection::NotFound(_)));
    }
}
