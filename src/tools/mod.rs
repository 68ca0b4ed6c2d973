mod output_finder;
mod path_validator;
mod scratch_workspace;
mod source_collector;

pub use output_finder::find_existing_outputs;
pub use path_validator::ensure_directory_exists;
pub use scratch_workspace::{ScratchWorkspace, TaskDir};
pub use source_collector::{CollectedSources, SourceFile, collect_sources};
