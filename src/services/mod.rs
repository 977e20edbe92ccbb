// Service exports
pub mod analyzer;
pub mod cache;
pub mod extractor;
pub mod jobs;
pub mod pipeline;
pub mod supabase;

pub use analyzer::{Analysis, AnalyzerClient, AnalyzerError};
pub use cache::{CacheError, CacheKey, CacheManager};
pub use extractor::{
    AggregatedContent, ContentExtractor, ExtractedContent, ExtractionResult, ExtractorError,
};
pub use jobs::{AnalysisJob, JobStatus, JobStore, JobStoreError, QueueStats};
pub use pipeline::{footprint_score, AnalysisPipeline, FootprintAnalysis, PipelineError};
pub use supabase::{SupabaseClient, SupabaseError};
