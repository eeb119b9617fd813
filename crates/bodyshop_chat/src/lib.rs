pub mod doc;
pub mod handlers;
pub mod intent;
pub mod logic;
#[cfg(test)]
mod logic_test;
pub mod routes;

pub use handlers::ChatState;
pub use logic::{advance, ChatEngine, ConversationState, Stage, Turn, TurnContext};
pub use routes::{chat_state, routes};
