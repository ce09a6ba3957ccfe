pub mod channels;
pub mod persistence;
pub mod project;
pub mod selection;
pub mod transport;
