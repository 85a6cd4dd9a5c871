pub mod config;
pub mod dates;
pub mod metrics;
pub mod normalize;
pub mod record;
pub mod schema;
pub mod shape;
pub mod timeline;

pub use config::{ConfigError, FetchConfig, FetchOverrides};
pub use metrics::{BillMetrics, aggregate, bipartisan_score};
pub use normalize::{NormalizedBill, UpstreamBill, normalize};
pub use record::{
    ActionRecord, BillId, BillRecord, Chamber, CosponsorRecord, Party, Sponsor, SubjectSet,
    TextFormat, TextVersion, TitleInfo,
};
pub use schema::tables;
pub use timeline::{Timeline, TimelineEntry, build_timeline};
