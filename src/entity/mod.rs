pub mod affiliate;
pub mod downline;

pub use affiliate::AffiliateStatus;
