//! Timeline composition: gather, sort, filter, paginate.
//!
//! Item kinds are fixed when items are gathered, so later stages match on
//! the enum instead of inspecting which fields happen to be populated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Branch, Interaction, InteractionTarget, InteractionType, Post, Project, UserSummary,
};
use crate::error::{AppError, Result};

pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Everything one user contributes to a timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceUser {
    pub user: UserSummary,
    #[serde(default)]
    pub post_interactions: Vec<Interaction>,
    #[serde(default)]
    pub branch_interactions: Vec<Interaction>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub branches: Vec<Branch>,
    #[serde(default)]
    pub posts: Vec<Post>,
}

impl SourceUser {
    pub fn new(user: UserSummary) -> Self {
        Self {
            user,
            post_interactions: Vec::new(),
            branch_interactions: Vec::new(),
            projects: Vec::new(),
            branches: Vec::new(),
            posts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TimelineItem {
    Interaction {
        user: UserSummary,
        interaction: Interaction,
    },
    Post {
        user: UserSummary,
        post: Post,
    },
    Branch {
        user: UserSummary,
        branch: Branch,
    },
    Project {
        user: UserSummary,
        project: Project,
    },
}

/// How a client should render an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    LikeOnBranch,
    LikeOnPost,
    ShareOnBranch,
    ShareOnPost,
    Post,
    Branch,
    Project,
}

impl TimelineItem {
    /// updated_at when present, otherwise created_at
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Interaction { interaction, .. } => interaction.created_at,
            Self::Post { post, .. } => post.updated_at.unwrap_or(post.created_at),
            Self::Branch { branch, .. } => branch.updated_at.unwrap_or(branch.created_at),
            Self::Project { project, .. } => project.updated_at.unwrap_or(project.created_at),
        }
    }

    /// `None` for interaction types that never appear on a timeline
    pub fn kind(&self) -> Option<TimelineKind> {
        match self {
            Self::Interaction { interaction, .. } => {
                match (interaction.interaction_type, interaction.target) {
                    (InteractionType::Like, InteractionTarget::Branch(_)) => {
                        Some(TimelineKind::LikeOnBranch)
                    }
                    (InteractionType::Like, InteractionTarget::Post(_)) => {
                        Some(TimelineKind::LikeOnPost)
                    }
                    (InteractionType::Share, InteractionTarget::Branch(_)) => {
                        Some(TimelineKind::ShareOnBranch)
                    }
                    (InteractionType::Share, InteractionTarget::Post(_)) => {
                        Some(TimelineKind::ShareOnPost)
                    }
                    _ => None,
                }
            }
            Self::Post { .. } => Some(TimelineKind::Post),
            Self::Branch { .. } => Some(TimelineKind::Branch),
            Self::Project { .. } => Some(TimelineKind::Project),
        }
    }

    /// Visibility rules, first match wins:
    /// LIKE/SHARE interactions and posts are always kept, other interactions
    /// are dropped, branches and projects follow their permissions.
    ///
    /// A post is kept even when its `content` is empty; the variant alone
    /// decides that it renders as a post.
    pub fn is_visible_to(&self, viewer: Option<Uuid>) -> bool {
        match self {
            Self::Interaction { interaction, .. } => matches!(
                interaction.interaction_type,
                InteractionType::Like | InteractionType::Share
            ),
            Self::Post { .. } => true,
            Self::Branch { branch, .. } => {
                branch.permissions.is_visible_to(branch.author_id, viewer)
            }
            Self::Project { project, .. } => {
                project.permissions.is_visible_to(project.author_id, viewer)
            }
        }
    }

    pub fn is_trending(&self) -> bool {
        match self {
            Self::Branch { branch, .. } => branch.is_trending(),
            Self::Project { project, .. } => project.is_trending(),
            _ => false,
        }
    }
}

/// A surviving item with its render kind resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub kind: TimelineKind,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub item: TimelineItem,
}

/// Extra narrowing applied after visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimelineFilter {
    #[default]
    All,
    /// Only branches and projects flagged trending in either dimension
    TrendingOnly,
}

impl TimelineFilter {
    fn keeps(&self, item: &TimelineItem) -> bool {
        match self {
            Self::All => true,
            Self::TrendingOnly => item.is_trending(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// `page` is 1-indexed
    pub fn new(page: usize, page_size: usize) -> Result<Self> {
        if page == 0 {
            return Err(AppError::BadRequest("page must be 1 or greater".to_string()));
        }
        if page_size == 0 {
            return Err(AppError::BadRequest(
                "page size must be 1 or greater".to_string(),
            ));
        }
        Ok(Self { page, page_size })
    }

    fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Flatten every source user's records into timeline items
pub fn gather(sources: &[SourceUser]) -> Vec<TimelineItem> {
    let mut items = Vec::new();

    for source in sources {
        let user = &source.user;

        for interaction in source
            .post_interactions
            .iter()
            .chain(source.branch_interactions.iter())
        {
            items.push(TimelineItem::Interaction {
                user: user.clone(),
                interaction: interaction.clone(),
            });
        }
        for project in &source.projects {
            items.push(TimelineItem::Project {
                user: user.clone(),
                project: project.clone(),
            });
        }
        for branch in &source.branches {
            items.push(TimelineItem::Branch {
                user: user.clone(),
                branch: branch.clone(),
            });
        }
        for post in &source.posts {
            items.push(TimelineItem::Post {
                user: user.clone(),
                post: post.clone(),
            });
        }
    }

    items
}

/// Newest first. Stable, so equal timestamps keep gather order.
pub fn sort_newest_first(items: &mut [TimelineItem]) {
    items.sort_by_key(|item| std::cmp::Reverse(item.timestamp()));
}

pub fn filter_visible(
    items: Vec<TimelineItem>,
    viewer: Option<Uuid>,
    filter: TimelineFilter,
) -> Vec<TimelineEntry> {
    items
        .into_iter()
        .filter(|item| item.is_visible_to(viewer) && filter.keeps(item))
        .filter_map(|item| {
            let kind = item.kind()?;
            Some(TimelineEntry {
                kind,
                timestamp: item.timestamp(),
                item,
            })
        })
        .collect()
}

/// Slice out one page. Pages past the end are empty, never an error.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total_items = items.len();
    let total_pages = total_items.div_ceil(request.page_size);

    let page_items = items
        .into_iter()
        .skip(request.offset())
        .take(request.page_size)
        .collect();

    Page {
        items: page_items,
        page: request.page,
        page_size: request.page_size,
        total_items,
        total_pages,
    }
}

/// Full pipeline for one request
pub fn compose(
    sources: &[SourceUser],
    viewer: Option<Uuid>,
    filter: TimelineFilter,
    request: PageRequest,
) -> Page<TimelineEntry> {
    let mut items = gather(sources);
    sort_newest_first(&mut items);
    let visible = filter_visible(items, viewer, filter);
    paginate(visible, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Permission;
    use chrono::Duration;

    fn user() -> UserSummary {
        UserSummary {
            id: Uuid::new_v4(),
            username: "maker".to_string(),
            nickname: None,
            avatar: None,
        }
    }

    fn post(at: DateTime<Utc>) -> Post {
        Post {
            id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            content: "hello".to_string(),
            created_at: at,
            updated_at: None,
            media: Vec::new(),
            interactions: Vec::new(),
        }
    }

    fn interaction(kind: InteractionType, target: InteractionTarget) -> Interaction {
        Interaction {
            id: Uuid::new_v4(),
            interaction_type: kind,
            user_id: Uuid::new_v4(),
            target,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_updated_at_wins_over_created_at() {
        let now = Utc::now();
        let mut edited = post(now - Duration::days(3));
        edited.updated_at = Some(now);
        let fresh = post(now - Duration::hours(1));

        let mut items = vec![
            TimelineItem::Post {
                user: user(),
                post: fresh.clone(),
            },
            TimelineItem::Post {
                user: user(),
                post: edited.clone(),
            },
        ];
        sort_newest_first(&mut items);

        assert_eq!(items[0].timestamp(), now);
    }

    #[test]
    fn test_sort_is_stable_for_equal_timestamps() {
        let at = Utc::now();
        let first = post(at);
        let second = post(at);
        let mut items = vec![
            TimelineItem::Post {
                user: user(),
                post: first.clone(),
            },
            TimelineItem::Post {
                user: user(),
                post: second.clone(),
            },
        ];

        sort_newest_first(&mut items);

        match &items[0] {
            TimelineItem::Post { post, .. } => assert_eq!(post.id, first.id),
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_render_kinds() {
        let cases = [
            (
                InteractionType::Like,
                InteractionTarget::Branch(Uuid::new_v4()),
                Some(TimelineKind::LikeOnBranch),
            ),
            (
                InteractionType::Like,
                InteractionTarget::Post(Uuid::new_v4()),
                Some(TimelineKind::LikeOnPost),
            ),
            (
                InteractionType::Share,
                InteractionTarget::Branch(Uuid::new_v4()),
                Some(TimelineKind::ShareOnBranch),
            ),
            (
                InteractionType::Share,
                InteractionTarget::Post(Uuid::new_v4()),
                Some(TimelineKind::ShareOnPost),
            ),
            (
                InteractionType::Bookmark,
                InteractionTarget::Post(Uuid::new_v4()),
                None,
            ),
        ];

        for (kind, target, expected) in cases {
            let item = TimelineItem::Interaction {
                user: user(),
                interaction: interaction(kind, target),
            };
            assert_eq!(item.kind(), expected, "{:?} on {}", kind, target);
        }
    }

    #[test]
    fn test_non_timeline_interactions_are_dropped() {
        let items: Vec<TimelineItem> = [
            InteractionType::Like,
            InteractionType::Report,
            InteractionType::Hide,
            InteractionType::Bookmark,
        ]
        .into_iter()
        .map(|kind| TimelineItem::Interaction {
            user: user(),
            interaction: interaction(kind, InteractionTarget::Post(Uuid::new_v4())),
        })
        .collect();

        let visible = filter_visible(items, None, TimelineFilter::All);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].kind, TimelineKind::LikeOnPost);
    }

    #[test]
    fn test_post_with_empty_content_is_kept() {
        let mut blank = post(Utc::now());
        blank.content = String::new();
        let item = TimelineItem::Post {
            user: user(),
            post: blank,
        };

        assert!(item.is_visible_to(None));
        let visible = filter_visible(vec![item], None, TimelineFilter::All);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].kind, TimelineKind::Post);
    }

    #[test]
    fn test_page_request_validation() {
        assert!(PageRequest::new(0, 5).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(1, DEFAULT_PAGE_SIZE).is_ok());
    }

    #[test]
    fn test_empty_sources_yield_empty_page() {
        let page = compose(
            &[],
            None,
            TimelineFilter::All,
            PageRequest::new(1, DEFAULT_PAGE_SIZE).unwrap(),
        );

        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_trending_filter_keeps_only_flagged_structures() {
        let source_user = user();
        let mut source = SourceUser::new(source_user.clone());
        let project = Project {
            id: Uuid::new_v4(),
            name: "hot".to_string(),
            description: String::new(),
            author_id: source_user.id,
            created_at: Utc::now(),
            updated_at: None,
            activity: 9,
            popularity: 9,
            trending_activity: true,
            trending_popularity: false,
            permissions: Permission::default(),
        };
        source.projects.push(project.clone());
        source.projects.push(Project {
            id: Uuid::new_v4(),
            trending_activity: false,
            ..project
        });
        source.posts.push(post(Utc::now()));

        let page = compose(
            &[source],
            None,
            TimelineFilter::TrendingOnly,
            PageRequest::new(1, 10).unwrap(),
        );

        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].kind, TimelineKind::Project);
    }

    #[test]
    fn test_entry_serializes_kind_and_payload() {
        let entry = TimelineEntry {
            kind: TimelineKind::Post,
            timestamp: Utc::now(),
            item: TimelineItem::Post {
                user: user(),
                post: post(Utc::now()),
            },
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "post");
        assert_eq!(json["post"]["content"], "hello");
        assert_eq!(json["user"]["username"], "maker");
    }
}
