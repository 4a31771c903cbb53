pub mod editor;
pub mod generator;
pub mod notification;
pub mod provider;
pub mod store;
pub mod wizard;
