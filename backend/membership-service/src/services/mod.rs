pub mod chat_space_membership;
pub mod stream_attendance;

pub use chat_space_membership::ChatSpaceMembershipService;
pub use stream_attendance::StreamAttendanceService;
