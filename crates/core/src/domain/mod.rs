pub mod contract;
pub mod product;
