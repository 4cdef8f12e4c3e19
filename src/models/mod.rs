pub mod availability;
pub mod booking;
pub mod category;
pub mod chat;
pub mod dispute;
pub mod review;
pub mod service;
pub mod user;

pub use availability::{TimeSlot, VendorAvailability};
pub use booking::{Booking, BookingDetails, BookingStatus};
pub use category::Category;
pub use chat::{Chat, ChatMessage, ChatSummary};
pub use dispute::{Dispute, DisputeStatus};
pub use review::{Review, ReviewWithAuthor};
pub use service::{Service, ServiceListing, ServiceStatus};
pub use user::{Role, TempUser, User};
