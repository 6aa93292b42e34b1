pub mod prelude;

pub mod contact_messages;
pub mod users;
