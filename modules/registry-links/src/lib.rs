pub mod checker;
pub mod worker;

pub use checker::{parse_candidate, HttpFetcher, PageFetcher, UrlNormalizer};
pub use worker::{
    link_check_channel, LinkCheckQueue, LinkCheckWorker, LinkChecker, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_SWEEP_INTERVAL,
};
