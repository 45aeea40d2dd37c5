//! View models and template rendering helpers.
//!
//! Handlers assemble these flat view structs so the templates stay free
//! of domain types and option-chasing.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::application::error::{ErrorReport, HttpError};
use crate::application::pagination::Page;
use crate::application::posts::FieldError;
use crate::domain::entities::{CommentEntry, FeedEntry, GroupRecord, UserRecord};
use crate::domain::posts::{format_human_datetime, preview};

const RENDER_ORIGIN: &str = "presentation::views::render";

/// Render a template into a response with the given status. A render
/// failure becomes a 500 carrying the askama error in its report.
pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => HttpError::from_error(
            RENDER_ORIGIN,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Template rendering failed",
            &err,
        )
        .into_response(),
    }
}

/// The shared 404 page, with a report attached so the miss shows up in
/// the response log.
pub fn render_not_found_response(viewer: ViewerView) -> Response {
    let mut response = render_template_response(
        ErrorTemplate {
            viewer,
            message: "Page not found".to_string(),
        },
        StatusCode::NOT_FOUND,
    );
    ErrorReport::message(RENDER_ORIGIN, StatusCode::NOT_FOUND, "Resource not found")
        .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct ViewerView {
    pub authenticated: bool,
    pub username: String,
}

impl ViewerView {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            username: String::new(),
        }
    }
}

pub fn viewer_view(viewer: Option<&UserRecord>) -> ViewerView {
    match viewer {
        Some(user) => ViewerView {
            authenticated: true,
            username: user.username.clone(),
        },
        None => ViewerView::anonymous(),
    }
}

#[derive(Clone)]
pub struct PostCardView {
    pub id: String,
    pub heading: String,
    pub body: String,
    pub author_username: String,
    pub created: String,
    pub has_group: bool,
    pub group_title: String,
    pub group_slug: String,
    pub has_image: bool,
    pub image: String,
}

pub fn post_card(entry: &FeedEntry) -> PostCardView {
    let (has_group, group_title, group_slug) = match &entry.group {
        Some(group) => (true, group.title.clone(), group.slug.clone()),
        None => (false, String::new(), String::new()),
    };

    PostCardView {
        id: entry.post.id.to_string(),
        heading: preview(&entry.post.body),
        body: entry.post.body.clone(),
        author_username: entry.author.username.clone(),
        created: format_human_datetime(entry.post.created_at),
        has_group,
        group_title,
        group_slug,
        has_image: entry.post.image.is_some(),
        image: entry.post.image.clone().unwrap_or_default(),
    }
}

#[derive(Clone)]
pub struct PaginationView {
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous: usize,
    pub next: usize,
}

pub fn pagination_view<T>(page: &Page<T>) -> PaginationView {
    PaginationView {
        number: page.number,
        total_pages: page.total_pages,
        total_items: page.total_items,
        has_previous: page.has_previous(),
        has_next: page.has_next(),
        previous: page.number.saturating_sub(1).max(1),
        next: (page.number + 1).min(page.total_pages),
    }
}

#[derive(Clone)]
pub struct CommentView {
    pub author_username: String,
    pub body: String,
    pub created: String,
}

pub fn comment_view(entry: &CommentEntry) -> CommentView {
    CommentView {
        author_username: entry.author.username.clone(),
        body: entry.comment.body.clone(),
        created: format_human_datetime(entry.comment.created_at),
    }
}

#[derive(Clone)]
pub struct GroupOptionView {
    pub id: String,
    pub title: String,
    pub selected: bool,
}

pub fn group_options(groups: &[GroupRecord], selected: Option<&str>) -> Vec<GroupOptionView> {
    groups
        .iter()
        .map(|group| {
            let id = group.id.to_string();
            GroupOptionView {
                selected: selected == Some(id.as_str()),
                id,
                title: group.title.clone(),
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct FormErrorView {
    pub field: String,
    pub message: String,
}

pub fn form_errors(errors: &[FieldError]) -> Vec<FormErrorView> {
    errors
        .iter()
        .map(|err| FormErrorView {
            field: err.field.to_string(),
            message: err.message.clone(),
        })
        .collect()
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub viewer: ViewerView,
    pub title: String,
    pub posts: Vec<PostCardView>,
    pub pagination: PaginationView,
}

#[derive(Template)]
#[template(path = "group_list.html")]
pub struct GroupTemplate {
    pub viewer: ViewerView,
    pub group_title: String,
    pub group_slug: String,
    pub group_description: String,
    pub posts: Vec<PostCardView>,
    pub pagination: PaginationView,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub viewer: ViewerView,
    pub owner_username: String,
    pub post_count: u64,
    pub following: bool,
    pub is_self: bool,
    pub can_follow: bool,
    pub posts: Vec<PostCardView>,
    pub pagination: PaginationView,
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
    pub viewer: ViewerView,
    pub title: String,
    pub posts: Vec<PostCardView>,
    pub pagination: PaginationView,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub viewer: ViewerView,
    pub post: PostCardView,
    pub author_post_count: u64,
    pub can_edit: bool,
    pub can_comment: bool,
    pub comments: Vec<CommentView>,
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub viewer: ViewerView,
    pub is_edit: bool,
    pub action: String,
    pub body: String,
    pub image: String,
    pub groups: Vec<GroupOptionView>,
    pub errors: Vec<FormErrorView>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub viewer: ViewerView,
    pub message: String,
}
