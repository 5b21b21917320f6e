use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use classbook_models::{
    AddAnswerDto, AddLessonDto, Assignment, AssignmentResponse, AssignmentState, Class,
    CreateAssignmentDto, CreateClassDto, CreateNewsDto, GradeSolutionDto, Lesson,
    MessageResponse, News, Role, School, Solution, SolutionResponse, SolutionState,
    StudentMembershipDto, SubmitSolutionDto, UpdateAssignmentDto, UpdateClassDto, UpdateNewsDto,
    UpdateProfileDto, UpdateSolutionDto, User,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::schools::controller::list_schools,
        crate::modules::schools::controller::get_school,
        crate::modules::schools::controller::list_school_students,
        crate::modules::schools::controller::list_school_teachers,
        crate::modules::schools::controller::list_school_lessons,
        crate::modules::classes::controller::list_classes,
        crate::modules::classes::controller::create_class,
        crate::modules::classes::controller::get_class,
        crate::modules::classes::controller::update_class,
        crate::modules::classes::controller::delete_class,
        crate::modules::classes::controller::add_student,
        crate::modules::classes::controller::remove_student,
        crate::modules::classes::controller::list_class_students,
        crate::modules::classes::controller::add_lesson,
        crate::modules::classes::controller::list_class_lessons,
        crate::modules::assignments::controller::list_assignments,
        crate::modules::assignments::controller::create_assignment,
        crate::modules::assignments::controller::get_assignment,
        crate::modules::assignments::controller::update_assignment,
        crate::modules::assignments::controller::add_answer,
        crate::modules::assignments::controller::list_assignment_solutions,
        crate::modules::assignments::controller::submit_solution,
        crate::modules::solutions::controller::list_solutions,
        crate::modules::solutions::controller::get_solution,
        crate::modules::solutions::controller::update_solution,
        crate::modules::solutions::controller::grade_solution,
        crate::modules::news::controller::list_news,
        crate::modules::news::controller::create_news,
        crate::modules::news::controller::get_news,
        crate::modules::news::controller::update_news,
        crate::modules::news::controller::delete_news,
        crate::modules::users::controller::list_my_lessons,
        crate::modules::users::controller::update_profile,
    ),
    components(
        schemas(
            User,
            Role,
            UpdateProfileDto,
            School,
            Class,
            Lesson,
            CreateClassDto,
            UpdateClassDto,
            StudentMembershipDto,
            AddLessonDto,
            Assignment,
            AssignmentState,
            AssignmentResponse,
            CreateAssignmentDto,
            UpdateAssignmentDto,
            AddAnswerDto,
            Solution,
            SolutionState,
            SolutionResponse,
            SubmitSolutionDto,
            UpdateSolutionDto,
            GradeSolutionDto,
            News,
            CreateNewsDto,
            UpdateNewsDto,
            MessageResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Schools", description = "Schools, their rosters and lesson catalog"),
        (name = "Classes", description = "Classes, class membership and lessons"),
        (name = "Assignments", description = "Assignments and submissions"),
        (name = "Solutions", description = "Solution edits and grading"),
        (name = "News", description = "School and class news"),
        (name = "Users", description = "The caller's own lessons and profile")
    ),
    info(
        title = "Classbook API",
        version = "0.1.0",
        description = "School management API: who may do what to which class, assignment, solution or news item, and when.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
