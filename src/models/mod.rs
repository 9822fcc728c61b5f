pub mod comment;
pub mod sentiment;

pub use comment::{summarize_posts, Comment, CommentRecord, LabeledComment, PostRecord, PostSummary};
pub use sentiment::{AggregateReport, Sentiment, SentimentResult};
