pub mod builders;
pub mod db;

#[allow(unused_imports)]
pub use builders::{ArtistBuilder, ShowBuilder, VenueBuilder};
pub use db::TestDb;
