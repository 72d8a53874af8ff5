pub mod branch_resolve;
pub mod locks;
pub mod release_ops;

pub use branch_resolve::BranchResolver;
pub use locks::NamespaceLocks;
pub use release_ops::ReleaseOrchestrator;
