//! Prompt template store: named `{placeholder}` templates and the set the agents use.

mod load;
mod template;

pub use load::{LoadError, PromptSet, ENV_PROMPTS_FILE};
pub use template::{PromptError, PromptTemplate};
