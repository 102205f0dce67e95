//! Block-scheduled sweeps over an external checker, result persistence and
//! batch plans.

mod batch;
mod hash;
mod plan;
pub mod render;
mod schedule;
pub mod sink;

pub use batch::{
    persist_report, run_batch, run_batch_with, BatchJobReport, BatchReport, JobStatus,
    BATCH_REPORT_FILE,
};
pub use hash::{stable_hash_string, to_canonical_json_bytes};
pub use plan::{BatchPlan, Scheduler, SweepDefaults, SweepEntry};
pub use render::{CommandRenderer, ModelRenderer, RendererSpec, TemplateRenderer};
pub use schedule::{run_sweep, BlockScheduler, SweepFailure, SweepState};
pub use sink::{
    file_stem, load_series, parameter_summary, persist, render_summary, topology_dir,
    write_series, PersistedPaths, SERIES_HEADER,
};
