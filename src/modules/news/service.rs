use tracing::{info, instrument};

use classbook_authz::{
    Action, Chain, Mutation, Precondition, Relationship, ResourceRef, Scan, Store,
};
use classbook_core::{AppError, Rejection};
use classbook_models::{CreateNewsDto, News, NewsId, UpdateNewsDto};

use crate::middleware::session::{NewsTarget, Session};

pub struct NewsService;

impl NewsService {
    /// The creator keeps the item; anyone else editing it does so as the
    /// manager of its school.
    fn editor(session: &Session, target: &NewsTarget) -> Precondition {
        if target.relationships.contains(Relationship::Creator) {
            Precondition::Exists(ResourceRef::News(target.news.id))
        } else {
            Precondition::SchoolManager {
                school_id: target.school_id,
                user_id: session.user_id(),
            }
        }
    }

    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn list_news(store: &dyn Store, session: &Session) -> Result<Vec<News>, AppError> {
        let chains = store
            .scan(Scan::NewsInSchools(session.actor.school_ids()))
            .await?;

        Ok(session
            .visible(chains)
            .into_iter()
            .filter_map(|chain| match chain {
                Chain::News { news, .. } => Some(news),
                _ => None,
            })
            .collect())
    }

    /// Posts to exactly one scope: a class (its teacher) or a school (its
    /// manager).
    #[instrument(skip(store, session, dto), fields(actor = %session.user_id()))]
    pub async fn create_news(
        store: &dyn Store,
        session: &Session,
        dto: CreateNewsDto,
    ) -> Result<News, AppError> {
        let (school_id, class_id, precondition) = match (dto.school_id, dto.class_id) {
            (None, Some(class_id)) => {
                let class = session.class(store, class_id, Action::CreateNews).await?;
                let precondition = Precondition::ClassTeacher {
                    class_id: class.id,
                    user_id: session.user_id(),
                };
                (None, Some(class.id), precondition)
            }
            (Some(school_id), None) => {
                let school = session.school(store, school_id, Action::CreateNews).await?;
                let precondition = Precondition::SchoolManager {
                    school_id: school.id,
                    user_id: session.user_id(),
                };
                (Some(school.id), None, precondition)
            }
            _ => {
                return Err(Rejection::validation(
                    "News must belong to exactly one of a class or a school.",
                )
                .into());
            }
        };

        let news = News {
            id: NewsId::new(),
            title: dto.title,
            context: dto.context,
            creator_id: session.user_id(),
            school_id,
            class_id,
            created_at: session.now,
            last_modified: session.now,
        };

        let plan = session
            .plan(Mutation::CreateNews(news))
            .require(precondition);
        let news = store.commit(plan).await?.into_news()?;

        info!(news_id = %news.id, "News created");
        Ok(news)
    }

    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn get_news(
        store: &dyn Store,
        session: &Session,
        news_id: NewsId,
    ) -> Result<News, AppError> {
        Ok(session.news(store, news_id, Action::View).await?.news)
    }

    #[instrument(skip(store, session, dto), fields(actor = %session.user_id()))]
    pub async fn update_news(
        store: &dyn Store,
        session: &Session,
        news_id: NewsId,
        dto: UpdateNewsDto,
    ) -> Result<News, AppError> {
        let target = session.news(store, news_id, Action::Update).await?;

        let plan = session
            .plan(Mutation::UpdateNews {
                news_id,
                title: dto.title,
                context: dto.context,
            })
            .require(Self::editor(session, &target));
        store.commit(plan).await?.into_news()
    }

    #[instrument(skip(store, session), fields(actor = %session.user_id()))]
    pub async fn delete_news(
        store: &dyn Store,
        session: &Session,
        news_id: NewsId,
    ) -> Result<(), AppError> {
        let target = session.news(store, news_id, Action::Delete).await?;

        let plan = session
            .plan(Mutation::DeleteNews { news_id })
            .require(Self::editor(session, &target));
        store.commit(plan).await?;

        info!(%news_id, "News deleted");
        Ok(())
    }
}
