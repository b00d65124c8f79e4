pub mod ruler;
pub mod simulate;
pub mod validate;
