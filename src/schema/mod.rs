pub mod rule;
pub mod vars;
