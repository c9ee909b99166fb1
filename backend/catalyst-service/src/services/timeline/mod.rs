pub mod composer;
pub mod service;

pub use composer::{
    compose, filter_visible, gather, paginate, sort_newest_first, Page, PageRequest, SourceUser,
    TimelineEntry, TimelineFilter, TimelineItem, TimelineKind, DEFAULT_PAGE_SIZE,
};
pub use service::{TimelineScope, TimelineService};
