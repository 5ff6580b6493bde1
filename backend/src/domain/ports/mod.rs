//! Domain ports for the hexagonal boundary.
//!
//! Driven ports: registry and configuration sources, identity, and the two
//! backend engines. Driving port: [`ProcedureService`].

mod macros;
pub(crate) use macros::define_port_error;

mod identity_provider;
mod procedure_service;
mod project_config_source;
mod registry_source;
mod relational_engine;
mod remote_engine;

#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{
    DEFAULT_PUBLIC_PROCEDURES, Identity, IdentityError, IdentityProvider,
    RequestClaimsIdentityProvider,
};
#[cfg(test)]
pub use procedure_service::MockProcedureService;
pub use procedure_service::ProcedureService;
#[cfg(test)]
pub use project_config_source::MockProjectConfigSource;
pub use project_config_source::{
    InMemoryProjectConfigSource, ProjectConfigSource, ProjectConfigSourceError,
};
#[cfg(test)]
pub use registry_source::MockRegistrySource;
pub use registry_source::{InMemoryRegistrySource, RegistrySource, RegistrySourceError};
pub use relational_engine::{RecordSets, RelationalEngine, RelationalEngineError};
pub use remote_engine::{
    DisabledRemoteEngine, RemoteDataset, RemoteEngine, RemoteEngineError, RemoteEnvelope,
    RemoteReturn,
};
