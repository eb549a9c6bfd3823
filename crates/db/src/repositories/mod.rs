//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` for single-statement operations or `&mut PgConnection`
//! when they must run inside a caller-owned transaction. Contended rows
//! (resources, waitlist entries, reservations, lane sessions) are always
//! re-read under `FOR UPDATE` before mutation.

pub mod checkin_block_repo;
pub mod customer_repo;
pub mod lane_session_repo;
pub mod reservation_repo;
pub mod resource_repo;
pub mod visit_repo;
pub mod waitlist_repo;

pub use checkin_block_repo::CheckinBlockRepo;
pub use customer_repo::CustomerRepo;
pub use lane_session_repo::LaneSessionRepo;
pub use reservation_repo::ReservationRepo;
pub use resource_repo::ResourceRepo;
pub use visit_repo::VisitRepo;
pub use waitlist_repo::WaitlistRepo;
