pub mod catalog;
pub mod details;
pub mod movie;
pub mod watchlist;

pub use catalog::CatalogPage;
pub use details::{CastMember, Credits, Genre, MovieDetails};
pub use movie::MovieSummary;
pub use watchlist::WatchlistEntry;
