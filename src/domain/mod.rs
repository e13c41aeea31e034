pub mod track;
pub mod user;
