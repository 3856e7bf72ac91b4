pub mod domain;
pub mod library;
pub mod lookup;
pub mod persistence;
pub mod ports;
pub mod profile;
pub mod repository;
pub mod vault;
pub mod views;

pub use domain::{Book, BookPatch, Definition, Genre, NewBook, Note, UserProfile, Vocabulary};
pub use library::{ImportSummary, Library, LibraryError, LibraryResult};
pub use lookup::DefinitionLookup;
pub use ports::{DefinitionProvider, KeyValueStore, PortError, PortResult};
pub use repository::{BookRepository, RepositoryError};
