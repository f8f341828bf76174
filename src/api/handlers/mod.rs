pub mod accounts;
pub mod earnings;
