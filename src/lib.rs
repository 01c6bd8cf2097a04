//! Sentimind core: packs AI-extracted review keywords into a bubble map and
//! runs the analyze and follow-up chat workflows as explicit state machines.

pub mod analysis_session;
pub mod api_types;
pub mod budget;
pub mod chat_session;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod pack;
pub mod prompts;
pub mod provider;
pub mod render;
pub mod sample;
pub mod viz_export;

pub use analysis_session::{AnalysisSession, AnalysisSnapshot, AnalysisStatus};
pub use chat_session::{ChatSession, ChatSnapshot, ChatStatus};
pub use error::{GeometryInputError, ProviderError, ValidationError};
pub use models::{
    AnalysisResult, Bounds, Category, ChatContext, ChatTurn, Insight, PackedCircle, Priority,
    Role, TrendPoint, WeightedItem,
};
pub use orchestrator::{run_report, KeywordMap, Sentimind};
pub use pack::pack;
pub use provider::AnalysisProvider;
