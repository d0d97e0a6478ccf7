//! Private link endpoint resource binding
//!
//! - `config` - typed configuration and observed state
//! - `validation` - cross-field checks run before any remote call
//! - `expand` / `flatten` - conversion to and from the ARM wire model
//! - `reconcile` - create/update, read and delete against a `NetworkClient`

pub mod config;
pub mod error;
pub mod expand;
pub mod flatten;
pub mod reconcile;
pub mod validation;

pub use config::{PrivateEndpointConfig, PrivateEndpointState, ServiceConnection};
pub use error::{EndpointError, Operation};
pub use reconcile::ApplyMode;
