pub mod columns;
pub mod loader;
pub mod model;
pub mod transform;

pub use model::UnidadeSaude;
pub use transform::{read_unidades_csv, transform_unidades, TransformOutcome};
