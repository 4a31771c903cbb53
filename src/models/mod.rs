pub mod metadata;
pub mod question;
