pub mod alphabet;
pub mod feature;
pub mod location;
pub mod position;
pub mod reference;
pub mod sequence;

pub use alphabet::{AlphabetTable, Symbol};
pub use feature::{Feature, Qualifier};
pub use location::{Location, SimpleLocation, Strand};
pub use position::Position;
pub use reference::Reference;
pub use sequence::{MetadataValue, Sequence};
