mod presets;
mod run;

pub use presets::cmd_presets;
pub use run::{PlanArgs, cmd_run};
