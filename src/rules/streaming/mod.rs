mod daily_volume;
mod structuring;

pub use daily_volume::DailyVolumeRule;
pub use structuring::StructuringRule;
