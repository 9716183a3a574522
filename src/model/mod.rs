pub mod attendance;
pub mod patch;
