pub mod enums;
pub mod conversation;
pub mod content;
pub mod ticket;

pub use conversation::*;
pub use content::*;
pub use ticket::*;
