mod capability;
mod clock;
mod ffprobe_info;
pub mod format;
mod frame_extractor;
mod path_validator;
mod progress_display;
mod progress_tracker;
mod scoped_dir;

pub use capability::{ExtractionCapability, FfmpegAvailability, FixedCapability};
pub use clock::{Clock, ManualClock, SystemClock};
pub use ffprobe_info::{
    FfmpegTool, MediaMetadata, MediaTool, ProbeReport, parse_probe_output, probe_media,
};
pub use frame_extractor::{
    DEFAULT_PREVIEW_COUNT, draw_timestamp, extract_random_frames, frame_file_name,
};
pub use path_validator::{ensure_directory_exists, resolve_directory, validate_file_exists};
pub use progress_display::{ProgressDisplay, describe_rate};
pub use progress_tracker::{
    DEFAULT_EMIT_INTERVAL, ProgressObserver, ProgressReporter, ProgressSnapshot, ProgressTracker,
    RateMode,
};
pub use scoped_dir::ScopedDirectory;
