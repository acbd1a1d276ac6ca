pub mod setup;
pub mod verify;
