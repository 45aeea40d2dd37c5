//! Post authoring behavior: authorization, comments, deletion cascade.

mod support;

use std::sync::Arc;

use rostra::application::posts::{MutationOutcome, PostDraft, PostError, PostService};
use rostra::application::repos::CommentsRepo;

use support::{MemoryStore, seed_group, seed_post, seed_user};

fn post_service(store: &Arc<MemoryStore>) -> PostService {
    PostService::new(store.clone(), store.clone(), store.clone())
}

fn draft(body: &str) -> PostDraft {
    PostDraft::parse(body, None, None).expect("valid draft")
}

#[tokio::test]
async fn create_sets_author_and_group() {
    let store = MemoryStore::new();
    let author = seed_user(&store, "author").await;
    let group = seed_group(&store, "A Group").await;

    let service = post_service(&store);
    let draft = PostDraft::parse("fresh words", Some(&group.id.to_string()), None)
        .expect("valid draft");
    let record = service.create(author.id, draft).await.expect("created");

    assert_eq!(record.author_id, author.id);
    assert_eq!(record.group_id, Some(group.id));

    let detail = service.detail(record.id).await.expect("detail");
    assert_eq!(detail.entry.author.username, "author");
    assert_eq!(detail.author_post_count, 1);
}

#[tokio::test]
async fn non_author_update_redirects_without_mutation() {
    let store = MemoryStore::new();
    let author = seed_user(&store, "author").await;
    let intruder = seed_user(&store, "intruder").await;
    let post = seed_post(&store, &author, None, "original words").await;

    let service = post_service(&store);
    let outcome = service
        .update(post.id, intruder.id, draft("tampered words"))
        .await
        .expect("update evaluated");

    match outcome {
        MutationOutcome::RedirectTo(target) => {
            assert_eq!(target, format!("/posts/{}", post.id));
        }
        MutationOutcome::Applied => panic!("non-author edit must not apply"),
    }

    let detail = service.detail(post.id).await.expect("detail");
    assert_eq!(detail.entry.post.body, "original words");
}

#[tokio::test]
async fn author_update_applies_and_keeps_creation_time() {
    let store = MemoryStore::new();
    let author = seed_user(&store, "author").await;
    let post = seed_post(&store, &author, None, "first take").await;

    let service = post_service(&store);
    let outcome = service
        .update(post.id, author.id, draft("second take"))
        .await
        .expect("update evaluated");
    assert!(matches!(outcome, MutationOutcome::Applied));

    let detail = service.detail(post.id).await.expect("detail");
    assert_eq!(detail.entry.post.body, "second take");
    assert_eq!(detail.entry.post.created_at, post.created_at);
    assert_eq!(detail.entry.post.author_id, author.id);
}

#[tokio::test]
async fn comments_attach_in_creation_order() {
    let store = MemoryStore::new();
    let author = seed_user(&store, "author").await;
    let reader = seed_user(&store, "reader").await;
    let post = seed_post(&store, &author, None, "discussable").await;

    let service = post_service(&store);
    service
        .add_comment(post.id, reader.id, "first!")
        .await
        .expect("comment added");
    service
        .add_comment(post.id, author.id, "thanks")
        .await
        .expect("comment added");

    let detail = service.detail(post.id).await.expect("detail");
    assert_eq!(detail.comments.len(), 2);
    assert_eq!(detail.comments[0].comment.body, "first!");
    assert_eq!(detail.comments[0].author.username, "reader");
    assert_eq!(detail.comments[1].author.username, "author");
}

#[tokio::test]
async fn blank_comments_are_dropped_silently() {
    let store = MemoryStore::new();
    let author = seed_user(&store, "author").await;
    let post = seed_post(&store, &author, None, "quiet thread").await;

    let service = post_service(&store);
    service
        .add_comment(post.id, author.id, "   ")
        .await
        .expect("no error");

    let detail = service.detail(post.id).await.expect("detail");
    assert!(detail.comments.is_empty());
}

#[tokio::test]
async fn commenting_on_missing_post_fails() {
    let store = MemoryStore::new();
    let reader = seed_user(&store, "reader").await;

    let service = post_service(&store);
    let err = service
        .add_comment(uuid::Uuid::new_v4(), reader.id, "into the void")
        .await
        .expect_err("missing post");
    assert!(matches!(err, PostError::NotFound));
}

#[tokio::test]
async fn delete_cascades_to_comments() {
    let store = MemoryStore::new();
    let author = seed_user(&store, "author").await;
    let post = seed_post(&store, &author, None, "doomed").await;

    let service = post_service(&store);
    service
        .add_comment(post.id, author.id, "soon gone")
        .await
        .expect("comment added");

    let outcome = service.delete(post.id, author.id).await.expect("deleted");
    assert!(matches!(outcome, MutationOutcome::Applied));

    let err = service.detail(post.id).await.expect_err("post gone");
    assert!(matches!(err, PostError::NotFound));

    let orphans = store.list_for_post(post.id).await.expect("comment list");
    assert!(orphans.is_empty());
}

#[tokio::test]
async fn non_author_delete_redirects_and_keeps_post() {
    let store = MemoryStore::new();
    let author = seed_user(&store, "author").await;
    let intruder = seed_user(&store, "intruder").await;
    let post = seed_post(&store, &author, None, "still here").await;

    let service = post_service(&store);
    let outcome = service
        .delete(post.id, intruder.id)
        .await
        .expect("delete evaluated");
    assert!(matches!(outcome, MutationOutcome::RedirectTo(_)));

    let detail = service.detail(post.id).await.expect("detail");
    assert_eq!(detail.entry.post.body, "still here");
}
