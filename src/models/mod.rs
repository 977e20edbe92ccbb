// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AgeRange, Application, ApplicationMatchReport, ApplicationStatus, CompatibilityReport,
    ContentAnalysis, DateMeDoc, FormQuestion, LinkKind, MatchmakingScore, PsychProfile,
    QuestionKind, Recommendation, SocialLink, UserProfile,
};
pub use requests::{
    AnalyzeMatchRequest, ApplicationListQuery, CreateDocRequest, CreateProfileRequest,
    FindMatchesRequest, MatchApplicationRequest, StatusQuery, SubmitApplicationRequest,
    UpdateApplicationStatusRequest, UpdateDocRequest, UpdateProfileRequest,
};
pub use responses::{
    ApplicationListResponse, ApplicationReceipt, ApplicationWithScore, CandidateSummary,
    DocListResponse, DocResponse, ErrorResponse, FindMatchesResponse, FootprintAnalysisResponse,
    HealthResponse, MatchApplicationResponse, ProfileResponse, PublicDocResponse, RankedCandidate,
    SubmitApplicationResponse,
};
