pub mod anonymize;
pub mod etl;
pub mod model;
pub mod seed;

pub use anonymize::Anonymizer;
pub use model::{FilaRegistro, Gravidade};
