mod fcfa;
mod helpers;
pub mod op;

pub use fcfa::{Fcfa, FcfaConversionError, CFA_CURRENCY_CODE, CFA_CURRENCY_CODE_LOWER};
pub use helpers::parse_boolean_flag;
