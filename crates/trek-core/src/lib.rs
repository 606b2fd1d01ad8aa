pub mod capability;
pub mod context;
pub mod types;

pub use capability::{CapabilityDescriptor, Registry, RegistryStats};
pub use context::{Context, ContextMetadata, StateProjection};
pub use types::*;
