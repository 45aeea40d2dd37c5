use std::sync::Arc;

use axum::{
    Router,
    extract::{Form, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    application::{
        error::HttpError,
        feed::{FEED_PAGE_SIZE, FeedError, FeedService, PROFILE_PAGE_SIZE},
        pagination::paginate,
        posts::{EditAccess, MutationOutcome, PostDraft, PostError, PostService, post_detail_path},
        profile::{FollowError, ProfileService},
        repos::{GroupsRepo, PostOrdering, UsersRepo},
    },
    cache::{CacheState, response_cache_layer},
    domain::entities::UserRecord,
    presentation::views::{
        FollowTemplate, GroupTemplate, IndexTemplate, PostDetailTemplate, PostFormTemplate,
        ProfileTemplate, ViewerView, comment_view, form_errors, group_options, pagination_view,
        post_card, render_not_found_response, render_template_response, viewer_view,
    },
};

use super::{
    middleware::{log_responses, set_request_context},
    session::{RequireViewer, Viewer},
};

const INDEX_TITLE: &str = "Latest updates";
const FOLLOW_TITLE: &str = "Followed authors";

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub profiles: Arc<ProfileService>,
    pub groups: Arc<dyn GroupsRepo>,
    pub users: Arc<dyn UsersRepo>,
    pub cache: Option<CacheState>,
}

pub fn build_router(state: HttpState) -> Router {
    // Only the index passes through the response cache; every other view
    // always renders fresh.
    let cached_routes = Router::new().route("/", get(index));
    let cached_routes = if let Some(cache_state) = state.cache.clone() {
        cached_routes.layer(middleware::from_fn_with_state(
            cache_state,
            response_cache_layer,
        ))
    } else {
        cached_routes
    };

    let fresh_routes = Router::new()
        .route("/group/{slug}", get(group_posts))
        .route("/profile/{username}", get(profile))
        .route("/profile/{username}/follow", get(profile_follow))
        .route("/profile/{username}/unfollow", get(profile_unfollow))
        .route("/follow", get(follow_index))
        .route("/posts/create", get(post_create_form).post(post_create))
        .route("/posts/{id}", get(post_detail))
        .route("/posts/{id}/edit", get(post_edit_form).post(post_edit))
        .route("/posts/{id}/delete", post(post_delete))
        .route("/posts/{id}/comment", post(add_comment));

    cached_routes
        .merge(fresh_routes)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageQuery {
    page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostFormData {
    body: String,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentFormData {
    body: String,
}

async fn index(
    State(state): State<HttpState>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Response {
    let viewer = viewer_view(viewer.0.as_ref());

    let entries = match state.feed.global_feed(PostOrdering::CreatedDesc).await {
        Ok(entries) => entries,
        Err(err) => return feed_error_to_response(err, viewer),
    };

    let page = paginate(entries, FEED_PAGE_SIZE, query.page.as_deref());
    let pagination = pagination_view(&page);
    let posts = page.items.iter().map(post_card).collect();

    render_template_response(
        IndexTemplate {
            viewer,
            title: INDEX_TITLE.to_string(),
            posts,
            pagination,
        },
        StatusCode::OK,
    )
}

async fn group_posts(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Response {
    let viewer = viewer_view(viewer.0.as_ref());

    let feed = match state
        .feed
        .group_feed(&slug, PostOrdering::CreatedDesc)
        .await
    {
        Ok(feed) => feed,
        Err(err) => return feed_error_to_response(err, viewer),
    };

    let page = paginate(feed.entries, FEED_PAGE_SIZE, query.page.as_deref());
    let pagination = pagination_view(&page);
    let posts = page.items.iter().map(post_card).collect();

    render_template_response(
        GroupTemplate {
            viewer,
            group_title: feed.group.title,
            group_slug: feed.group.slug,
            group_description: feed.group.description,
            posts,
            pagination,
        },
        StatusCode::OK,
    )
}

async fn profile(
    State(state): State<HttpState>,
    Path(username): Path<String>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Response {
    let viewer_id = viewer.0.as_ref().map(|user| user.id);
    let viewer = viewer_view(viewer.0.as_ref());

    let feed = match state
        .feed
        .profile_feed(&username, viewer_id, PostOrdering::CreatedDesc)
        .await
    {
        Ok(feed) => feed,
        Err(err) => return feed_error_to_response(err, viewer),
    };

    let is_self = viewer.authenticated && viewer.username == feed.owner.username;
    let page = paginate(feed.entries, PROFILE_PAGE_SIZE, query.page.as_deref());
    let pagination = pagination_view(&page);
    let posts = page.items.iter().map(post_card).collect();

    render_template_response(
        ProfileTemplate {
            can_follow: viewer.authenticated && !is_self,
            viewer,
            owner_username: feed.owner.username,
            post_count: feed.post_count,
            following: feed.following,
            is_self,
            posts,
            pagination,
        },
        StatusCode::OK,
    )
}

async fn follow_index(
    State(state): State<HttpState>,
    RequireViewer(user): RequireViewer,
    Query(query): Query<PageQuery>,
) -> Response {
    let viewer = viewer_view(Some(&user));

    let entries = match state
        .feed
        .followed_feed(user.id, PostOrdering::CreatedDesc)
        .await
    {
        Ok(entries) => entries,
        Err(err) => return feed_error_to_response(err, viewer),
    };

    let page = paginate(entries, FEED_PAGE_SIZE, query.page.as_deref());
    let pagination = pagination_view(&page);
    let posts = page.items.iter().map(post_card).collect();

    render_template_response(
        FollowTemplate {
            viewer,
            title: FOLLOW_TITLE.to_string(),
            posts,
            pagination,
        },
        StatusCode::OK,
    )
}

async fn post_detail(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
    viewer: Viewer,
) -> Response {
    let viewer_id = viewer.0.as_ref().map(|user| user.id);
    let viewer = viewer_view(viewer.0.as_ref());

    let detail = match state.posts.detail(id).await {
        Ok(detail) => detail,
        Err(err) => return post_error_to_response(err, viewer),
    };

    let can_edit = viewer_id == Some(detail.entry.post.author_id);

    render_template_response(
        PostDetailTemplate {
            can_comment: viewer.authenticated,
            viewer,
            post: post_card(&detail.entry),
            author_post_count: detail.author_post_count,
            can_edit,
            comments: detail.comments.iter().map(comment_view).collect(),
        },
        StatusCode::OK,
    )
}

async fn post_create_form(
    State(state): State<HttpState>,
    RequireViewer(user): RequireViewer,
) -> Response {
    let viewer = viewer_view(Some(&user));

    let groups = match state.groups.list_all().await {
        Ok(groups) => groups,
        Err(err) => {
            return HttpError::from_error(
                "infra::http::post_create_form",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            )
            .into_response();
        }
    };

    render_template_response(
        PostFormTemplate {
            viewer,
            is_edit: false,
            action: "/posts/create".to_string(),
            body: String::new(),
            image: String::new(),
            groups: group_options(&groups, None),
            errors: Vec::new(),
        },
        StatusCode::OK,
    )
}

async fn post_create(
    State(state): State<HttpState>,
    RequireViewer(user): RequireViewer,
    Form(form): Form<PostFormData>,
) -> Response {
    let draft = match PostDraft::parse(&form.body, form.group.as_deref(), form.image.as_deref()) {
        Ok(draft) => draft,
        Err(errors) => {
            return render_post_form_with_errors(&state, &user, None, &form, errors).await;
        }
    };

    match state.posts.create(user.id, draft).await {
        Ok(_) => Redirect::to(&format!("/profile/{}", user.username)).into_response(),
        Err(err) => post_error_to_response(err, viewer_view(Some(&user))),
    }
}

async fn post_edit_form(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
    RequireViewer(user): RequireViewer,
) -> Response {
    let viewer = viewer_view(Some(&user));

    let (entry, access) = match state.posts.edit_target(id, user.id).await {
        Ok(target) => target,
        Err(err) => return post_error_to_response(err, viewer),
    };

    if let EditAccess::RedirectTo(target) = access {
        return Redirect::to(&target).into_response();
    }

    let groups = match state.groups.list_all().await {
        Ok(groups) => groups,
        Err(err) => {
            return HttpError::from_error(
                "infra::http::post_edit_form",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            )
            .into_response();
        }
    };

    let selected = entry.post.group_id.map(|group_id| group_id.to_string());

    render_template_response(
        PostFormTemplate {
            viewer,
            is_edit: true,
            action: format!("/posts/{id}/edit"),
            body: entry.post.body,
            image: entry.post.image.unwrap_or_default(),
            groups: group_options(&groups, selected.as_deref()),
            errors: Vec::new(),
        },
        StatusCode::OK,
    )
}

async fn post_edit(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
    RequireViewer(user): RequireViewer,
    Form(form): Form<PostFormData>,
) -> Response {
    let draft = match PostDraft::parse(&form.body, form.group.as_deref(), form.image.as_deref()) {
        Ok(draft) => draft,
        Err(errors) => {
            return render_post_form_with_errors(&state, &user, Some(id), &form, errors).await;
        }
    };

    match state.posts.update(id, user.id, draft).await {
        Ok(MutationOutcome::Applied) => Redirect::to(&post_detail_path(id)).into_response(),
        Ok(MutationOutcome::RedirectTo(target)) => Redirect::to(&target).into_response(),
        Err(err) => post_error_to_response(err, viewer_view(Some(&user))),
    }
}

async fn post_delete(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
    RequireViewer(user): RequireViewer,
) -> Response {
    match state.posts.delete(id, user.id).await {
        Ok(MutationOutcome::Applied) => {
            Redirect::to(&format!("/profile/{}", user.username)).into_response()
        }
        Ok(MutationOutcome::RedirectTo(target)) => Redirect::to(&target).into_response(),
        Err(err) => post_error_to_response(err, viewer_view(Some(&user))),
    }
}

async fn add_comment(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
    RequireViewer(user): RequireViewer,
    Form(form): Form<CommentFormData>,
) -> Response {
    match state.posts.add_comment(id, user.id, &form.body).await {
        Ok(()) => Redirect::to(&post_detail_path(id)).into_response(),
        Err(err) => post_error_to_response(err, viewer_view(Some(&user))),
    }
}

async fn profile_follow(
    State(state): State<HttpState>,
    Path(username): Path<String>,
    RequireViewer(user): RequireViewer,
) -> Response {
    match state.profiles.follow(&user, &username).await {
        Ok(()) => Redirect::to(&format!("/profile/{username}")).into_response(),
        Err(err) => follow_error_to_response(err, viewer_view(Some(&user))),
    }
}

async fn profile_unfollow(
    State(state): State<HttpState>,
    Path(username): Path<String>,
    RequireViewer(user): RequireViewer,
) -> Response {
    match state.profiles.unfollow(&user, &username).await {
        Ok(()) => Redirect::to(&format!("/profile/{username}")).into_response(),
        Err(err) => follow_error_to_response(err, viewer_view(Some(&user))),
    }
}

/// Re-render the create/edit form with validation errors. Nothing was
/// persisted; the submitted values are echoed back.
async fn render_post_form_with_errors(
    state: &HttpState,
    user: &UserRecord,
    edit_target: Option<Uuid>,
    form: &PostFormData,
    errors: Vec<crate::application::posts::FieldError>,
) -> Response {
    let viewer = viewer_view(Some(user));

    let groups = match state.groups.list_all().await {
        Ok(groups) => groups,
        Err(err) => {
            return HttpError::from_error(
                "infra::http::render_post_form_with_errors",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            )
            .into_response();
        }
    };

    let action = match edit_target {
        Some(id) => format!("/posts/{id}/edit"),
        None => "/posts/create".to_string(),
    };

    render_template_response(
        PostFormTemplate {
            viewer,
            is_edit: edit_target.is_some(),
            action,
            body: form.body.clone(),
            image: form.image.clone().unwrap_or_default(),
            groups: group_options(&groups, form.group.as_deref()),
            errors: form_errors(&errors),
        },
        StatusCode::UNPROCESSABLE_ENTITY,
    )
}

fn feed_error_to_response(error: FeedError, viewer: ViewerView) -> Response {
    match error {
        FeedError::UnknownGroup | FeedError::UnknownUser => render_not_found_response(viewer),
        other => HttpError::from(other).into_response(),
    }
}

fn post_error_to_response(error: PostError, viewer: ViewerView) -> Response {
    match error {
        PostError::NotFound => render_not_found_response(viewer),
        other => HttpError::from(other).into_response(),
    }
}

fn follow_error_to_response(error: FollowError, viewer: ViewerView) -> Response {
    match error {
        FollowError::UnknownUser => render_not_found_response(viewer),
        other => HttpError::from(other).into_response(),
    }
}
