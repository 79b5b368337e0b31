mod knowledge_base;
mod tables;
mod types;

pub use knowledge_base::{AlleleDefinition, DosingRule, DrugDefinition, GeneDefinition, KnowledgeBase};
pub use types::{Action, AlleleFunction, Mechanism, Phenotype};
