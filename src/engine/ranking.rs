//! Ranked, offset-paginated listings.
//!
//! Every call scans the live scope from the store, scores it, sorts it into a
//! total order and slices one page out. Nothing is cached; the 24 hour expiry
//! keeps the scope small. `totalItems` comes from the same scan as the page.

use std::cmp::Ordering;

use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        comment::{Comment, CommentView},
        page::{CommentSort, FeedSort, Page, PageMeta, PageRequest},
        thread::{Thread, ThreadView},
    },
    store::Store,
};

// Feed score = 2 x likes + 1 x clicks + 0.1 x messages, kept in tenths so
// sorting is exact integer comparison.
const THREAD_LIKE_WEIGHT_TENTHS: i64 = 20;
const THREAD_CLICK_WEIGHT_TENTHS: i64 = 10;
const THREAD_MESSAGE_WEIGHT_TENTHS: i64 = 1;

// Comment popularity = 2 x likes + replies.
const COMMENT_LIKE_WEIGHT: i64 = 2;
const COMMENT_REPLY_WEIGHT: i64 = 1;

fn thread_score_tenths(thread: &Thread) -> i64 {
    THREAD_LIKE_WEIGHT_TENTHS * thread.like_count
        + THREAD_CLICK_WEIGHT_TENTHS * thread.clicks
        + THREAD_MESSAGE_WEIGHT_TENTHS * thread.message_count
}

/// Hot score of a thread as exposed on feed items.
pub fn thread_score(thread: &Thread) -> f64 {
    thread_score_tenths(thread) as f64 / 10.0
}

pub fn comment_score(comment: &Comment) -> i64 {
    COMMENT_LIKE_WEIGHT * comment.like_count + COMMENT_REPLY_WEIGHT * comment.reply_count
}

fn oldest_thread_first(a: &Thread, b: &Thread) -> Ordering {
    a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
}

fn oldest_comment_first(a: &Comment, b: &Comment) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.message_number.cmp(&b.message_number))
}

/// Sorts threads for the feed. Ties on score fall back to newest first.
pub fn sort_threads(threads: &mut [Thread], sort: FeedSort) {
    match sort {
        FeedSort::New => threads.sort_by(|a, b| oldest_thread_first(b, a)),
        FeedSort::Old => threads.sort_by(oldest_thread_first),
        FeedSort::Hot => threads.sort_by(|a, b| {
            thread_score_tenths(b)
                .cmp(&thread_score_tenths(a))
                .then_with(|| oldest_thread_first(b, a))
        }),
    }
}

/// Sorts comments of one thread. Popularity ties fall back to newest first.
pub fn sort_comments(comments: &mut [Comment], sort: CommentSort) {
    match sort {
        CommentSort::New => comments.sort_by(|a, b| oldest_comment_first(b, a)),
        CommentSort::Old => comments.sort_by(oldest_comment_first),
        CommentSort::Popular => comments.sort_by(|a, b| {
            comment_score(b)
                .cmp(&comment_score(a))
                .then_with(|| oldest_comment_first(b, a))
        }),
    }
}

/// Slices `[skip, skip + limit)` out of an already sorted scope.
pub fn paginate<T>(sorted: Vec<T>, request: PageRequest) -> Page<T> {
    let meta = PageMeta::new(sorted.len() as i64, request);
    let items = sorted
        .into_iter()
        .skip(request.skip())
        .take(request.limit as usize)
        .collect();
    Page { items, meta }
}

/// Ranked feed of all live threads.
pub async fn feed(
    store: &dyn Store,
    sort: FeedSort,
    request: PageRequest,
    viewer: Option<&str>,
) -> Result<Page<ThreadView>, AppError> {
    let mut threads = store.live_threads().await?;
    sort_threads(&mut threads, sort);

    Ok(paginate(threads, request).map(|thread| {
        let mut view = thread.view(viewer);
        view.score = Some(thread_score(&thread));
        view
    }))
}

/// Ranked comments of one live thread.
pub async fn thread_comments(
    store: &dyn Store,
    thread_id: Uuid,
    sort: CommentSort,
    request: PageRequest,
    viewer: Option<&str>,
) -> Result<Page<CommentView>, AppError> {
    if store.find_thread(thread_id).await?.is_none() {
        return Err(AppError::thread_not_found());
    }

    let mut comments = store.live_comments(thread_id).await?;
    sort_comments(&mut comments, sort);

    Ok(paginate(comments, request).map(|comment| comment.view(viewer)))
}

/// Threads a token has liked, newest first.
pub async fn liked_threads(store: &dyn Store, token: &str) -> Result<Vec<ThreadView>, AppError> {
    Ok(store
        .threads_liked_by(token)
        .await?
        .iter()
        .map(|thread| thread.view(Some(token)))
        .collect())
}
