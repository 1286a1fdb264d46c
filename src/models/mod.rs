mod delivery;
mod market;
mod news;
mod report;

pub use delivery::{ChannelKind, DeliveryResult, RenderedReport};
pub use market::{MarketDataset, PricePoint, TickerSpec};
pub use news::NewsArticle;
pub use report::{ChartArtifact, PeriodReturn, ReportData, Sentiment, SnapshotEntry, TickerSection};
