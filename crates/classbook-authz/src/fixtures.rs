//! Shared test world: one school with a manager, one class with a teacher,
//! two students, an assignment due at [`deadline`] and a submitted solution.

use chrono::{DateTime, Duration, Utc};

use classbook_models::{
    Assignment, AssignmentId, Class, ClassId, Lesson, LessonId, NationalId, News, NewsId, Role,
    School, SchoolId, Solution, SolutionId, User, UserId,
};

use crate::identity::{ActorContext, ClassMembership};
use crate::relationship::Chain;

pub fn deadline() -> DateTime<Utc> {
    DateTime::from_timestamp(1_750_000_000, 0).unwrap()
}

pub fn before_deadline() -> DateTime<Utc> {
    deadline() - Duration::seconds(1)
}

pub fn after_deadline() -> DateTime<Utc> {
    deadline() + Duration::seconds(1)
}

pub fn user(role: Role) -> User {
    let id = UserId::new();
    let digits = format!("{:010}", id.into_inner().as_u128() % 10_000_000_000);
    User {
        id,
        username: format!("{}-{}", role, &digits[..4]),
        first_name: "Test".into(),
        last_name: role.to_string(),
        email: format!("{}@example.com", digits),
        national_id: NationalId::new(digits).unwrap(),
        role,
        bio: None,
        is_active: true,
        created_at: deadline() - Duration::days(30),
    }
}

pub struct World {
    pub manager: User,
    pub teacher: User,
    pub student: User,
    pub classmate: User,
    pub school: School,
    pub lesson: Lesson,
    pub class: Class,
    pub assignment: Assignment,
    pub solution: Solution,
    pub class_news: News,
    pub school_news: News,
}

impl World {
    pub fn new() -> Self {
        let manager = user(Role::Manager);
        let teacher = user(Role::Teacher);
        let student = user(Role::Student);
        let classmate = user(Role::Student);
        let created = deadline() - Duration::days(7);

        let school = School {
            id: SchoolId::new(),
            name: "Northside High".into(),
            manager_id: Some(manager.id),
            created_at: created,
        };
        let lesson = Lesson {
            id: LessonId::new(),
            name: "Algebra".into(),
        };
        let class = Class {
            id: ClassId::new(),
            name: "10-B".into(),
            school_id: school.id,
            teacher_id: Some(teacher.id),
            student_ids: vec![student.id, classmate.id],
            lesson_ids: vec![lesson.id],
            created_at: created,
        };
        let assignment = Assignment {
            id: AssignmentId::new(),
            title: "Quadratics".into(),
            context: Some("Exercises 1-10".into()),
            attachment: None,
            grade_max: 100.0,
            deadline: deadline(),
            answer_text: None,
            answer_file: None,
            lesson_id: lesson.id,
            class_id: class.id,
            created_at: created,
            last_modified: created,
        };
        let solution = Solution {
            id: SolutionId::new(),
            context: Some("x = 3".into()),
            attachment: None,
            grade: None,
            graded_at: None,
            student_id: student.id,
            assignment_id: assignment.id,
            created_at: created,
            last_modified: created,
        };
        let class_news = News {
            id: NewsId::new(),
            title: "Field trip".into(),
            context: "Bring a lunch.".into(),
            creator_id: teacher.id,
            school_id: None,
            class_id: Some(class.id),
            created_at: created,
            last_modified: created,
        };
        let school_news = News {
            id: NewsId::new(),
            title: "Holiday".into(),
            context: "School closed Friday.".into(),
            creator_id: manager.id,
            school_id: Some(school.id),
            class_id: None,
            created_at: created,
            last_modified: created,
        };

        Self {
            manager,
            teacher,
            student,
            classmate,
            school,
            lesson,
            class,
            assignment,
            solution,
            class_news,
            school_news,
        }
    }

    fn membership(&self) -> ClassMembership {
        ClassMembership {
            class_id: self.class.id,
            school_id: self.school.id,
        }
    }

    pub fn manager_ctx(&self) -> ActorContext {
        let mut ctx = ActorContext::bare(self.manager.clone());
        ctx.managed_school = Some(self.school.id);
        ctx
    }

    pub fn teacher_ctx(&self) -> ActorContext {
        let mut ctx = ActorContext::bare(self.teacher.clone());
        ctx.taught_classes.push(self.membership());
        ctx
    }

    pub fn student_ctx(&self) -> ActorContext {
        let mut ctx = ActorContext::bare(self.student.clone());
        ctx.attended_classes.push(self.membership());
        ctx
    }

    pub fn classmate_ctx(&self) -> ActorContext {
        let mut ctx = ActorContext::bare(self.classmate.clone());
        ctx.attended_classes.push(self.membership());
        ctx
    }

    pub fn school_chain(&self) -> Chain {
        Chain::School(self.school.clone())
    }

    pub fn class_chain(&self) -> Chain {
        Chain::Class(self.class.clone())
    }

    pub fn assignment_chain(&self) -> Chain {
        Chain::Assignment {
            assignment: self.assignment.clone(),
            class: self.class.clone(),
        }
    }

    pub fn solution_chain(&self) -> Chain {
        Chain::Solution {
            solution: self.solution.clone(),
            assignment: self.assignment.clone(),
            class: self.class.clone(),
        }
    }

    pub fn class_news_chain(&self) -> Chain {
        Chain::News {
            news: self.class_news.clone(),
            class: Some(self.class.clone()),
            school_id: self.school.id,
        }
    }

    pub fn school_news_chain(&self) -> Chain {
        Chain::News {
            news: self.school_news.clone(),
            class: None,
            school_id: self.school.id,
        }
    }

    pub fn all_chains(&self) -> Vec<Chain> {
        vec![
            self.school_chain(),
            self.class_chain(),
            self.assignment_chain(),
            self.solution_chain(),
            self.class_news_chain(),
            self.school_news_chain(),
        ]
    }
}
