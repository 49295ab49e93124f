//! Reference data: EMAP accreditation standards and training priorities.

mod service;

#[cfg(test)]
mod tests;

pub use service::CatalogService;
