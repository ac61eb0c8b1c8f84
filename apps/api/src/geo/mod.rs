// Geospatial primitives: coordinates, haversine distance, geocoding with a TTL cache.
// All provider traffic goes through `geocoder::Geocoder`; nothing else calls the provider.

pub mod cache;
pub mod coordinate;
pub mod distance;
pub mod geocoder;
pub mod provider;

pub use coordinate::Coordinate;
pub use distance::distance_miles;
pub use geocoder::Geocoder;
