pub mod detail_extractor;
pub mod droid;
pub mod job_orchestrator;
pub mod lead_assembler;
pub mod lead_pipeline;
pub mod listing_discovery;
pub mod surface;
pub mod website_prober;

pub use detail_extractor::*;
pub use droid::*;
pub use job_orchestrator::*;
pub use lead_assembler::*;
pub use lead_pipeline::*;
pub use listing_discovery::*;
pub use surface::*;
pub use website_prober::*;
