pub mod client;
pub mod controller;
pub mod effect;
pub mod keyword;
pub mod session;

pub use crate::domain::model::{ClassifierMode, Review, Sentiment, ServiceVersionInfo};
pub use crate::domain::ports::{ConfigProvider, SentimentClassifier};
pub use crate::utils::error::Result;
