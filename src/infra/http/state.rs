use std::sync::Arc;

use crate::application::contact::ContactService;
use crate::application::pages::PageService;
use crate::application::posts::PostService;
use crate::application::projects::ProjectService;
use crate::application::revalidate::RevalidationService;
use crate::application::search::SearchService;
use crate::application::site::SiteService;
use crate::cache::PageCache;
use crate::content::ContentClient;

#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentClient>,
    pub posts: Arc<PostService>,
    pub projects: Arc<ProjectService>,
    pub pages: Arc<PageService>,
    pub site: Arc<SiteService>,
    pub search: Arc<SearchService>,
    pub revalidation: Arc<RevalidationService>,
    pub contact: Arc<ContactService>,
    pub page_cache: Arc<PageCache>,
}
