//! One-vs-all and all-vs-all reductions from multiclass to binary classification.
pub use self::ava::AvaClassifier;
pub use self::core::MulticlassOptions;
pub use self::ova::OvaClassifier;

mod ava;
mod core;
mod ova;
