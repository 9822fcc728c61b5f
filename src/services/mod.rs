pub mod aggregate;
pub mod analysis;
pub mod lexicon;
pub mod pipeline;
pub mod progress;

pub use aggregate::{aggregate, aggregate_labels};
pub use analysis::{resolve_post_title, Analysis, AnalysisService, CacheConfig};
pub use lexicon::{write_labels, LexiconScorer};
pub use pipeline::SentimentPipeline;
pub use progress::{noop_progress, NoopProgressReporter, ProgressReporter};
