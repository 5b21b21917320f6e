//! Staff operations that bypass the policy engine.

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use validator::Validate;

use classbook_auth::create_access_token;
use classbook_authz::{Chain, Mutation, Plan, Precondition, ResourceRef, Store};
use classbook_config::JwtConfig;
use classbook_core::{AppError, Rejection};
use classbook_models::{
    Class, ClassId, CreateClassDto, CreateSchoolDto, CreateUserDto, Role, School, SchoolId, User,
    UserId,
};

#[instrument(skip(store, dto), fields(username = %dto.username, role = %dto.role))]
pub async fn create_user(
    store: &dyn Store,
    dto: CreateUserDto,
    now: DateTime<Utc>,
) -> Result<User, AppError> {
    dto.validate()?;

    let user = User {
        id: UserId::new(),
        username: dto.username,
        first_name: dto.first_name,
        last_name: dto.last_name,
        email: dto.email,
        national_id: dto.national_id,
        role: dto.role,
        bio: dto.bio,
        is_active: dto.is_active,
        created_at: now,
    };

    let user = store.insert_user(user).await?;
    info!(user_id = %user.id, "User created");
    Ok(user)
}

#[instrument(skip(store, dto), fields(name = %dto.name))]
pub async fn create_school(
    store: &dyn Store,
    dto: CreateSchoolDto,
    now: DateTime<Utc>,
) -> Result<School, AppError> {
    dto.validate()?;

    let school = School {
        id: SchoolId::new(),
        name: dto.name,
        manager_id: dto.manager_id,
        created_at: now,
    };

    let school = store.insert_school(school).await?;
    info!(school_id = %school.id, "School created");
    Ok(school)
}

/// Creates a class directly, without a manager actor. The teacher, if
/// given, must hold the teacher role.
#[instrument(skip(store, dto), fields(school_id = %dto.school_id, name = %dto.name))]
pub async fn create_class(
    store: &dyn Store,
    dto: CreateClassDto,
    now: DateTime<Utc>,
) -> Result<Class, AppError> {
    dto.validate()?;

    match store.load(ResourceRef::School(dto.school_id)).await? {
        Some(Chain::School(_)) => {}
        _ => return Err(Rejection::not_found("School not found.").into()),
    }

    if let Some(teacher_id) = dto.teacher_id {
        let teacher = store.user(teacher_id).await?;
        if teacher.map(|t| t.role) != Some(Role::Teacher) {
            return Err(Rejection::validation(
                "The class teacher must be a user with the teacher role.",
            )
            .into());
        }
    }

    let class = Class {
        id: ClassId::new(),
        name: dto.name,
        school_id: dto.school_id,
        teacher_id: dto.teacher_id,
        student_ids: Vec::new(),
        lesson_ids: Vec::new(),
        created_at: now,
    };

    let plan = Plan::staff(Mutation::CreateClass(class), now)
        .require(Precondition::Exists(ResourceRef::School(dto.school_id)));
    let class = store.commit(plan).await?.into_class()?;

    info!(class_id = %class.id, "Class created");
    Ok(class)
}

#[instrument(skip(store))]
pub async fn set_user_active(
    store: &dyn Store,
    user_id: UserId,
    active: bool,
) -> Result<User, AppError> {
    let user = store.set_user_active(user_id, active).await?;
    info!(user_id = %user.id, active, "User activation changed");
    Ok(user)
}

/// Mints an access token for an existing user.
pub async fn issue_token(
    store: &dyn Store,
    user_id: UserId,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let user = store
        .user(user_id)
        .await?
        .ok_or_else(|| Rejection::not_found("User not found."))?;
    create_access_token(user.id, user.role, jwt_config)
}
