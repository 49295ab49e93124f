//! Program enrollment and everything that hangs off a program: its required
//! documentation records, reviews, reviewer assignments and findings.

mod populate;
mod service;

#[cfg(test)]
mod tests;

pub use populate::populate;
pub use service::ProgramService;
