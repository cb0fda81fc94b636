pub mod currency;
pub mod jwt;
pub mod validation;

pub use currency::{format_rupees, format_rupees_simple};
pub use jwt::{Claims, JwtService};
pub use validation::*;
