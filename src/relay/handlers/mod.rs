pub mod control;
pub mod voice;
