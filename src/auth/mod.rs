pub mod accounts;
pub mod events;
pub mod forms;
pub mod handlers;
pub mod login_counter;
pub mod password;
pub mod session;
pub mod users;
