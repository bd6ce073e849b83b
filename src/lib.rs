pub mod api;
pub mod chain;
pub mod compiler;
pub mod error;
pub mod forms;
pub mod session;
pub mod solc;
pub mod sources;

pub use chain::ChainClient;
pub use compiler::{select_deployable, Compiler, DeployArtifact};
pub use error::{Error, Result};
pub use forms::{contract_forms, FieldKind, FieldSpec, FunctionForm};
pub use session::{DeployedContract, Session};
pub use sources::{SourceStore, SourceUpload};
