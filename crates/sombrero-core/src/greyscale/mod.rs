pub mod consensus;
pub mod detect;
pub mod filesystem;
pub mod format;
pub mod interpolate;
pub mod panels;
pub mod policy;
pub mod repair;
pub mod text;

pub use consensus::{ConsensusError, average, delta};
pub use detect::{content_has_missing, count_missing, has_missing};
pub use filesystem::{RepairFileSystem, StdFileSystem};
pub use format::{
    decode_series, encode_series, first_series, read_series, read_series_from_compilation,
    read_series_from_fixture,
};
pub use interpolate::{
    AcceptDefaults, InterpolateOutcome, InterpolateReport, InterpolateRequest, OperatorPrompt,
    RunNotice, interpolate,
};
pub use panels::{DeltaPanel, GreyscalePanels, RawPanel};
pub use policy::{SourceCandidates, SourcePreferences};
pub use repair::{RepairError, RepairReport, RestoreError, RestoreReport, replace, restore};
