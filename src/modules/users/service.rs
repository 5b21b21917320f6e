use std::collections::BTreeSet;

use tracing::{info, instrument};

use classbook_authz::{Action, Chain, Mutation, ResourceRef, Store};
use classbook_core::AppError;
use classbook_models::{Lesson, UpdateProfileDto, User};

use crate::middleware::session::Session;

pub struct UserService;

impl UserService {
    /// Lessons offered by the classes the actor teaches or attends.
    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn my_lessons(store: &dyn Store, session: &Session) -> Result<Vec<Lesson>, AppError> {
        session.own(Action::ListLessons)?;

        let targets = session.actor.class_ids().into_iter().map(ResourceRef::Class);
        let chains = session.load_all(store, targets).await?;
        let ids: BTreeSet<_> = session
            .visible(chains)
            .into_iter()
            .filter_map(|chain| match chain {
                Chain::Class(class) => Some(class.lesson_ids),
                _ => None,
            })
            .flatten()
            .collect();

        store.lessons(&ids.into_iter().collect::<Vec<_>>()).await
    }

    #[instrument(skip(store, session, dto), fields(actor = %session.user_id()))]
    pub async fn update_profile(
        store: &dyn Store,
        session: &Session,
        dto: UpdateProfileDto,
    ) -> Result<User, AppError> {
        session.own(Action::Update)?;

        let bio = dto.bio.filter(|bio| !bio.trim().is_empty());
        let user = store
            .commit(session.plan(Mutation::UpdateProfile {
                user_id: session.user_id(),
                bio,
            }))
            .await?
            .into_user()?;

        info!("Profile updated");
        Ok(user)
    }
}
