pub mod hook;
pub mod usage;

pub use hook::HookJson;
pub use usage::UsageSnapshot;
