/// Auth Manager - Error pages.
use askama::Template;

use crate::error::ContentNotFound;
use crate::templates::base::LayoutContext;

#[derive(Template)]
#[template(path = "errors/not_found.html")]
pub struct NotFoundTemplate {
    pub title: String,
    pub layout: LayoutContext,
    pub not_found: ContentNotFound,
}

impl NotFoundTemplate {
    pub fn new(not_found: &ContentNotFound, layout: LayoutContext) -> Self {
        Self {
            title: not_found.title.clone(),
            layout,
            not_found: not_found.clone(),
        }
    }
}
