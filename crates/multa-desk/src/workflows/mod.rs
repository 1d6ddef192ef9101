pub mod advertencia;
pub mod billing;
mod collaborator;
pub mod feedback;
pub mod intake;

pub use collaborator::CollaboratorError;
