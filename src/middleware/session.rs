//! The acting user as the store sees them right now.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};

use classbook_authz::{
    Action, ActorContext, Chain, Mutation, Plan, RelationshipSet, ResourceRef, Store, authorize,
    authorize_own, is_visible,
};
use classbook_core::{AppError, Rejection};
use classbook_models::{
    Assignment, AssignmentId, Class, ClassId, News, NewsId, School, SchoolId, Solution, SolutionId,
    UserId,
};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// A loaded news item with its scope and the actor's relationships to it.
#[derive(Debug, Clone)]
pub struct NewsTarget {
    pub news: News,
    pub class: Option<Class>,
    pub school_id: SchoolId,
    pub relationships: RelationshipSet,
}

/// Actor plus the request instant. The clock is read once, here, and the
/// same instant drives the policy and workflow checks. The store re-reads
/// its own clock when the plan commits.
#[derive(Debug, Clone)]
pub struct Session {
    pub actor: ActorContext,
    pub now: DateTime<Utc>,
}

impl Session {
    pub fn new(actor: ActorContext, now: DateTime<Utc>) -> Self {
        Self { actor, now }
    }

    pub fn user_id(&self) -> UserId {
        self.actor.id()
    }

    pub fn plan(&self, mutation: Mutation) -> Plan {
        Plan::new(self.actor.id(), mutation, self.now)
    }

    /// Gates an action on the actor's own account.
    pub fn own(&self, action: Action) -> Result<(), AppError> {
        authorize_own(&self.actor, action, self.now)?;
        Ok(())
    }

    /// Loads every target that still exists. Missing ones are skipped.
    pub async fn load_all(
        &self,
        store: &dyn Store,
        targets: impl IntoIterator<Item = ResourceRef>,
    ) -> Result<Vec<Chain>, AppError> {
        let mut chains = Vec::new();
        for target in targets {
            if let Some(chain) = store.load(target).await? {
                chains.push(chain);
            }
        }
        Ok(chains)
    }

    /// Drops chains the actor may not see.
    pub fn visible(&self, chains: Vec<Chain>) -> Vec<Chain> {
        chains
            .into_iter()
            .filter(|chain| is_visible(&self.actor, chain, self.now))
            .collect()
    }

    pub async fn authorize(
        &self,
        store: &dyn Store,
        target: ResourceRef,
        action: Action,
    ) -> Result<(Chain, RelationshipSet), AppError> {
        let chain = store
            .load(target)
            .await?
            .ok_or_else(|| Rejection::not_found(format!("{} not found.", target.kind())))?;
        let relationships = authorize(&self.actor, &chain, action, self.now)?;
        Ok((chain, relationships))
    }

    pub async fn school(
        &self,
        store: &dyn Store,
        id: SchoolId,
        action: Action,
    ) -> Result<School, AppError> {
        match self.authorize(store, ResourceRef::School(id), action).await? {
            (Chain::School(school), _) => Ok(school),
            (chain, _) => Err(unexpected(&chain)),
        }
    }

    pub async fn class(
        &self,
        store: &dyn Store,
        id: ClassId,
        action: Action,
    ) -> Result<Class, AppError> {
        match self.authorize(store, ResourceRef::Class(id), action).await? {
            (Chain::Class(class), _) => Ok(class),
            (chain, _) => Err(unexpected(&chain)),
        }
    }

    pub async fn assignment(
        &self,
        store: &dyn Store,
        id: AssignmentId,
        action: Action,
    ) -> Result<(Assignment, Class), AppError> {
        match self.authorize(store, ResourceRef::Assignment(id), action).await? {
            (Chain::Assignment { assignment, class }, _) => Ok((assignment, class)),
            (chain, _) => Err(unexpected(&chain)),
        }
    }

    pub async fn solution(
        &self,
        store: &dyn Store,
        id: SolutionId,
        action: Action,
    ) -> Result<(Solution, Assignment, Class), AppError> {
        match self.authorize(store, ResourceRef::Solution(id), action).await? {
            (
                Chain::Solution {
                    solution,
                    assignment,
                    class,
                },
                _,
            ) => Ok((solution, assignment, class)),
            (chain, _) => Err(unexpected(&chain)),
        }
    }

    pub async fn news(
        &self,
        store: &dyn Store,
        id: NewsId,
        action: Action,
    ) -> Result<NewsTarget, AppError> {
        match self.authorize(store, ResourceRef::News(id), action).await? {
            (
                Chain::News {
                    news,
                    class,
                    school_id,
                },
                relationships,
            ) => Ok(NewsTarget {
                news,
                class,
                school_id,
                relationships,
            }),
            (chain, _) => Err(unexpected(&chain)),
        }
    }
}

fn unexpected(chain: &Chain) -> AppError {
    AppError::internal(anyhow::anyhow!(
        "Store returned a {} chain for another resource kind",
        chain.kind()
    ))
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;

        let actor = state
            .store
            .actor(auth_user.user_id())
            .await?
            .ok_or_else(|| AppError::unauthorized("User not found"))?;

        Ok(Session::new(actor, state.clock.now()))
    }
}
