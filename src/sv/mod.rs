pub mod affiliate;
pub mod approval;
pub mod chain;
pub mod downline;
#[cfg(test)]
pub mod test_utils;

pub use affiliate::Affiliate;
pub use approval::Approval;
pub use chain::Chain;
pub use downline::Downline;
