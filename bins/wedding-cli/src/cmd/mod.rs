pub mod history;
pub mod invoke;
