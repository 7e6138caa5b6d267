pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod llm;
pub mod models;
pub mod snap;
pub mod stages;

pub use config::{ClipConstraints, EngineConfig};
pub use engine::{ClipEngine, EngineOutput};
pub use error::{ClipError, ClipResult};
pub use io::{
    import_candidates, load_side_channels, parse_proposals_file, parse_transcript_file,
    write_candidates_json, ClipReport, RunMetadata,
};
pub use llm::{AnthropicClient, AnthropicConfig};
pub use models::{
    Candidate, ExportedCandidate, Interval, RawProposal, SideChannels, TranscriptIndex,
    TranscriptSegment, WindowConfig, WindowSet, Word,
};
pub use snap::{Refiner, SnapConfig};
pub use stages::{
    execute_render, ProposalConfig, ProposalSource, ToneClassifier, ToneConfig, ToneVerdict,
};
