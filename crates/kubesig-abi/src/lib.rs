//! kubesig ABI crate: stable contracts shared by the verification engine and the
//! collaborators it drives (registries, cluster access, signature schemes).

pub mod collab;
pub mod schemes;
pub mod signature;

pub use collab::*;
pub use schemes::*;
pub use signature::*;
