mod stock;
mod web;

pub use stock::{StockPhotoSearch, StockSearchConfig};
pub use web::{WebImageSearch, WebSearchConfig};
